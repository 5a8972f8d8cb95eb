//! An in-memory [`FileWriter`].

use camino::{Utf8Path, Utf8PathBuf};
use pbxgen::write::{FileWriter, WriteOutcome};
use std::collections::BTreeMap;
use std::io;

/// Records written files in memory and counts actual writes.
#[derive(Debug, Default)]
pub struct MemoryWriter {
    files: BTreeMap<Utf8PathBuf, String>,
    writes: usize,
}

impl MemoryWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Content last written to `path`.
    pub fn get(&self, path: impl AsRef<Utf8Path>) -> Option<&str> {
        self.files.get(path.as_ref()).map(String::as_str)
    }

    /// Every path written so far, sorted.
    pub fn paths(&self) -> Vec<&Utf8Path> {
        self.files.keys().map(Utf8PathBuf::as_path).collect()
    }

    /// Number of writes that changed content.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl FileWriter for MemoryWriter {
    fn write_if_changed(&mut self, path: &Utf8Path, content: &str) -> io::Result<WriteOutcome> {
        if self.files.get(path).is_some_and(|existing| existing == content) {
            return Ok(WriteOutcome::Unchanged);
        }
        self.files.insert(path.to_owned(), content.to_owned());
        self.writes += 1;
        Ok(WriteOutcome::Written)
    }
}
