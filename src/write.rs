//! Write-if-changed persistence for generated files.
//!
//! Regenerating a project from an unchanged graph must not touch the files
//! on disk, otherwise the IDE reloads the project. [`CapStdWriter`] reads the
//! existing file first and only writes when the content differs.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs as cap_fs};
use std::io;
use tracing::info;

/// Result of a write-if-changed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The file was created or replaced.
    Written,
    /// The file already held identical content.
    Unchanged,
}

/// Destination for generated files.
pub trait FileWriter {
    /// Write `content` to `path` unless it already holds exactly that
    /// content, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    fn write_if_changed(&mut self, path: &Utf8Path, content: &str) -> io::Result<WriteOutcome>;
}

/// Writes through `cap-std` directory handles.
#[derive(Debug, Default, Clone, Copy)]
pub struct CapStdWriter;

impl CapStdWriter {
    /// Create a writer using ambient file-system authority.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// Open the closest existing ancestor of `path` and return it with the
/// remaining relative path.
fn derive_dir_and_relative(path: &Utf8Path) -> io::Result<(cap_fs::Dir, Utf8PathBuf)> {
    if path.is_relative() {
        let dir = cap_fs::Dir::open_ambient_dir(".", ambient_authority())?;
        return Ok((dir, path.to_owned()));
    }
    let (base, dir) = path
        .ancestors()
        .skip(1)
        .find_map(|candidate| {
            cap_fs::Dir::open_ambient_dir(candidate.as_str(), ambient_authority())
                .ok()
                .map(|dir| (candidate.to_owned(), dir))
        })
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no existing ancestor directory for {path}"),
            )
        })?;
    let relative = path
        .strip_prefix(&base)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?
        .to_owned();
    Ok((dir, relative))
}

impl FileWriter for CapStdWriter {
    fn write_if_changed(&mut self, path: &Utf8Path, content: &str) -> io::Result<WriteOutcome> {
        let (dir, relative) = derive_dir_and_relative(path)?;
        match dir.read_to_string(relative.as_str()) {
            Ok(existing) if existing == content => {
                info!("{path} is up to date");
                return Ok(WriteOutcome::Unchanged);
            }
            Ok(_) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }
        if let Some(parent) = relative.parent().filter(|p| !p.as_str().is_empty()) {
            dir.create_dir_all(parent.as_str())?;
        }
        dir.write(relative.as_str(), content)?;
        info!("Wrote {path}");
        Ok(WriteOutcome::Written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result, ensure};

    fn temp_root() -> Result<(tempfile::TempDir, Utf8PathBuf)> {
        let temp = tempfile::tempdir().context("create temp dir")?;
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf())
            .map_err(|path| anyhow::anyhow!("non UTF-8 temp dir {}", path.display()))?;
        Ok((temp, root))
    }

    #[test]
    fn creates_parents_and_skips_identical_content() -> Result<()> {
        let (_temp, root) = temp_root()?;
        let path = root.join("out/Debug/all.xcodeproj/project.pbxproj");
        let mut writer = CapStdWriter::new();

        let first = writer.write_if_changed(&path, "content")?;
        ensure!(first == WriteOutcome::Written, "first write reported {first:?}");
        let second = writer.write_if_changed(&path, "content")?;
        ensure!(second == WriteOutcome::Unchanged, "second write reported {second:?}");
        let third = writer.write_if_changed(&path, "changed")?;
        ensure!(third == WriteOutcome::Written, "third write reported {third:?}");

        let on_disk = std::fs::read_to_string(&path).context("read back")?;
        ensure!(on_disk == "changed", "unexpected content {on_disk:?}");
        Ok(())
    }

    #[test]
    fn unchanged_file_keeps_its_modification_time() -> Result<()> {
        let (_temp, root) = temp_root()?;
        let path = root.join("settings.xcsettings");
        let mut writer = CapStdWriter::new();
        writer.write_if_changed(&path, "same")?;
        let before = std::fs::metadata(&path)?.modified()?;
        writer.write_if_changed(&path, "same")?;
        let after = std::fs::metadata(&path)?.modified()?;
        ensure!(before == after, "file was rewritten");
        Ok(())
    }
}
