//! Source-absolute files and directories.
//!
//! Paths in the resolved graph are expressed relative to the source root with
//! a leading `//`. Directories always end in `/`. [`rebase_path`] converts a
//! source-absolute path into a path relative to another source directory,
//! which is how build-directory relative values are produced for the
//! generated project.

use itertools::Itertools;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Errors raised when a path cannot be resolved against a source directory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The path does not start with `//`.
    #[error("path `{path}` is not source-absolute (expected a leading `//`)")]
    NotSourceAbsolute {
        /// Offending path.
        path: String,
    },
    /// A relative file name was empty, absolute, or climbed out of its base.
    #[error("`{path}` cannot be resolved inside `{base}`")]
    OutsideDirectory {
        /// Offending relative path.
        path: String,
        /// Directory the path was resolved against.
        base: String,
    },
    /// An output directory pattern used an unknown `{{...}}` substitution.
    #[error("unknown substitution `{{{{{name}}}}}` in pattern `{pattern}`")]
    UnknownSubstitution {
        /// Substitution name without braces.
        name: String,
        /// Full pattern text.
        pattern: String,
    },
    /// An output directory pattern opened a substitution without closing it.
    #[error("unterminated substitution in pattern `{pattern}`")]
    UnterminatedSubstitution {
        /// Full pattern text.
        pattern: String,
    },
}

/// A file path, either source-absolute (`//a/b.cc`) or system-absolute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceFile(String);

impl SourceFile {
    /// Wrap a path value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the underlying path text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The final path component.
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Whether the path is expressed relative to the source root.
    #[must_use]
    pub fn is_source_absolute(&self) -> bool {
        self.0.starts_with("//")
    }
}

impl fmt::Display for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for SourceFile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SourceFile {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self)
    }
}

/// A source-absolute directory. Always starts with `//` and ends with `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceDir(String);

impl SourceDir {
    /// The source root, `//`.
    #[must_use]
    pub fn root() -> Self {
        Self(String::from("//"))
    }

    /// Build a directory from slash-separated components below the root.
    ///
    /// Empty components are dropped, so `"a//b/"` and `"a/b"` are equal.
    #[must_use]
    pub fn from_components(relative: &str) -> Self {
        let mut value = String::from("//");
        for component in relative.split('/').filter(|c| !c.is_empty()) {
            value.push_str(component);
            value.push('/');
        }
        Self(value)
    }

    /// Parse a source-absolute directory, adding the trailing slash if absent.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::NotSourceAbsolute`] when `value` lacks the `//`
    /// prefix.
    pub fn parse(value: &str) -> Result<Self, PathError> {
        value
            .strip_prefix("//")
            .map(Self::from_components)
            .ok_or_else(|| PathError::NotSourceAbsolute {
                path: value.to_owned(),
            })
    }

    /// Borrow the directory text, including the trailing slash.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path components below the source root.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|c| !c.is_empty())
    }

    /// The enclosing directory; the root is its own parent.
    #[must_use]
    pub fn parent(&self) -> Self {
        let components: Vec<&str> = self.components().collect();
        let kept = components.len().saturating_sub(1);
        Self::from_components(&components.iter().take(kept).join("/"))
    }

    /// Whether `path` lies inside this directory (textual prefix test).
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        path.starts_with(&self.0)
    }

    /// Resolve a relative file name inside this directory.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::OutsideDirectory`] when `relative` is empty,
    /// absolute, or contains a `..` component.
    pub fn resolve_relative_file(&self, relative: &str) -> Result<SourceFile, PathError> {
        let escapes = relative
            .split('/')
            .any(|component| component == "..");
        if relative.is_empty() || relative.starts_with('/') || escapes {
            return Err(PathError::OutsideDirectory {
                path: relative.to_owned(),
                base: self.0.clone(),
            });
        }
        Ok(SourceFile(format!("{}{relative}", self.0)))
    }
}

impl Default for SourceDir {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for SourceDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for SourceDir {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SourceDir {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// Express the source-absolute `path` relative to `dest`.
///
/// Returns `"."` when both name the same directory.
///
/// # Errors
///
/// Returns [`PathError::NotSourceAbsolute`] when `path` lacks the `//` prefix.
///
/// # Examples
///
/// ```
/// use pbxgen::graph::{SourceDir, rebase_path};
///
/// let build_dir = SourceDir::parse("//out/Debug").expect("dir");
/// assert_eq!(rebase_path("//", &build_dir).expect("rebase"), "../..");
/// assert_eq!(rebase_path("//out/Debug/App.app", &build_dir).expect("rebase"), "App.app");
/// ```
pub fn rebase_path(path: &str, dest: &SourceDir) -> Result<String, PathError> {
    let relative = path
        .strip_prefix("//")
        .ok_or_else(|| PathError::NotSourceAbsolute {
            path: path.to_owned(),
        })?;
    let components: Vec<&str> = relative.split('/').filter(|c| !c.is_empty()).collect();
    let dest_components: Vec<&str> = dest.components().collect();
    let common = components
        .iter()
        .zip(&dest_components)
        .take_while(|(a, b)| a == b)
        .count();

    let climb = dest_components.len().saturating_sub(common);
    let joined = std::iter::repeat_n("..", climb)
        .chain(components.iter().skip(common).copied())
        .join("/");
    if joined.is_empty() {
        Ok(String::from("."))
    } else {
        Ok(joined)
    }
}
