//! Target labels of the form `//dir:name(//toolchain:name)`.

use super::source::SourceDir;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced when parsing a [`Label`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelError {
    /// The label did not start with `//`.
    #[error("label `{label}` must start with `//`")]
    NotSourceAbsolute {
        /// Offending label text.
        label: String,
    },
    /// The label named no target.
    #[error("label `{label}` has an empty target name")]
    EmptyName {
        /// Offending label text.
        label: String,
    },
    /// The toolchain suffix was not a balanced `( ... )` group.
    #[error("label `{label}` has an unbalanced toolchain suffix")]
    UnbalancedToolchain {
        /// Offending label text.
        label: String,
    },
}

/// A fully-qualified target label.
///
/// Labels order by directory, then name, then toolchain, which is the order
/// targets are materialized in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label {
    dir: SourceDir,
    name: String,
    toolchain: Option<Box<Label>>,
}

impl Label {
    /// Build a label from its parts.
    #[must_use]
    pub fn new(dir: SourceDir, name: impl Into<String>) -> Self {
        Self {
            dir,
            name: name.into(),
            toolchain: None,
        }
    }

    /// Return this label qualified by `toolchain`.
    #[must_use]
    pub fn with_toolchain(mut self, toolchain: Self) -> Self {
        self.toolchain = Some(Box::new(toolchain.without_toolchain()));
        self
    }

    /// Strip any toolchain qualification.
    #[must_use]
    pub fn without_toolchain(mut self) -> Self {
        self.toolchain = None;
        self
    }

    /// Parse a label such as `//ios/app:app(//build/toolchain:clang)`.
    ///
    /// A label without `:` names the target matching its last directory
    /// component, so `//base` is `//base:base`.
    ///
    /// # Errors
    ///
    /// Returns a [`LabelError`] when the text is not source-absolute, names
    /// no target, or carries an unbalanced toolchain suffix.
    ///
    /// # Examples
    ///
    /// ```
    /// use pbxgen::graph::Label;
    ///
    /// let label = Label::parse("//base").expect("label");
    /// assert_eq!(label.to_string(), "//base:base");
    /// ```
    pub fn parse(text: &str) -> Result<Self, LabelError> {
        let trimmed = text.trim();
        let (body, toolchain) = split_toolchain(trimmed)?;
        let mut label = parse_plain(body, trimmed)?;
        if let Some(toolchain) = toolchain {
            label.toolchain = Some(Box::new(parse_plain(toolchain, trimmed)?));
        }
        Ok(label)
    }

    /// Directory containing the defining build file.
    #[must_use]
    pub const fn dir(&self) -> &SourceDir {
        &self.dir
    }

    /// Target name within the directory.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Toolchain qualification, if any.
    #[must_use]
    pub fn toolchain(&self) -> Option<&Self> {
        self.toolchain.as_deref()
    }

    /// Render the label without its toolchain suffix.
    #[must_use]
    pub fn user_visible_name(&self) -> String {
        let dir = self.dir.as_str();
        let trimmed = dir.strip_suffix('/').filter(|d| *d != "/").unwrap_or(dir);
        format!("{trimmed}:{}", self.name)
    }
}

fn split_toolchain(text: &str) -> Result<(&str, Option<&str>), LabelError> {
    let unbalanced = || LabelError::UnbalancedToolchain {
        label: text.to_owned(),
    };
    match text.strip_suffix(')') {
        Some(stripped) => {
            let (body, toolchain) = stripped.split_once('(').ok_or_else(unbalanced)?;
            if toolchain.contains('(') || body.contains(')') {
                return Err(unbalanced());
            }
            Ok((body, Some(toolchain)))
        }
        None if text.contains('(') || text.contains(')') => Err(unbalanced()),
        None => Ok((text, None)),
    }
}

fn parse_plain(body: &str, original: &str) -> Result<Label, LabelError> {
    let rest = body
        .strip_prefix("//")
        .ok_or_else(|| LabelError::NotSourceAbsolute {
            label: original.to_owned(),
        })?;
    let (dir, name) = match rest.split_once(':') {
        Some((dir, name)) => (dir, name),
        None => (rest, rest.rsplit('/').next().unwrap_or(rest)),
    };
    if name.is_empty() {
        return Err(LabelError::EmptyName {
            label: original.to_owned(),
        });
    }
    Ok(Label::new(SourceDir::from_components(dir), name))
}

impl FromStr for Label {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user_visible_name())?;
        if let Some(toolchain) = &self.toolchain {
            write!(f, "({})", toolchain.user_visible_name())?;
        }
        Ok(())
    }
}

impl Serialize for Label {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Label {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("//ios/app:app", "//ios/app/", "app", None)]
    #[case("//base", "//base/", "base", None)]
    #[case("//:root", "//", "root", None)]
    #[case(
        "//ios/app:host(//build/toolchain:clang)",
        "//ios/app/",
        "host",
        Some("//build/toolchain:clang")
    )]
    fn parses_labels(
        #[case] text: &str,
        #[case] dir: &str,
        #[case] name: &str,
        #[case] toolchain: Option<&str>,
    ) {
        let label = Label::parse(text).expect("label");
        assert_eq!(label.dir().as_str(), dir);
        assert_eq!(label.name(), name);
        assert_eq!(
            label.toolchain().map(ToString::to_string).as_deref(),
            toolchain
        );
    }

    #[rstest]
    #[case("ios/app:app")]
    #[case("//ios/app:")]
    #[case("//ios/app:app(//tc:x")]
    #[case("//ios/app:app)")]
    fn rejects_malformed_labels(#[case] text: &str) {
        assert!(Label::parse(text).is_err());
    }

    #[test]
    fn display_round_trips_toolchain_suffix() {
        let text = "//a/b:c(//tc:host)";
        assert_eq!(Label::parse(text).expect("label").to_string(), text);
        assert_eq!(Label::parse("//:root").expect("label").to_string(), "//:root");
    }

    #[test]
    fn orders_by_directory_then_name() {
        let mut labels: Vec<Label> = ["//b:a", "//a:z", "//a:b", "//a:b(//tc:x)"]
            .iter()
            .map(|s| Label::parse(s).expect("label"))
            .collect();
        labels.sort();
        let names: Vec<String> = labels.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["//a:b", "//a:b(//tc:x)", "//a:z", "//b:a"]);
    }
}
