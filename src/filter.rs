//! Target selection.
//!
//! Targets are optionally narrowed with a `;`-separated list of label
//! patterns, then executables that are bundled by a `bundle_data` target are
//! dropped, since the bundle is the debuggable unit. The result is sorted by
//! label.

use crate::graph::{BuildGraph, Label, OutputType, SourceDir, Target};
use miette::Diagnostic;
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// A label pattern failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("invalid label pattern `{pattern}`: {reason}")]
#[diagnostic(
    code(pbxgen::filter::syntax),
    help("patterns look like //dir:name, //dir:*, //dir/* or *, optionally followed by (//toolchain:label)")
)]
pub struct FilterSyntaxError {
    /// The offending pattern.
    pub pattern: String,
    /// Why it was rejected.
    pub reason: String,
}

/// How a [`LabelPattern`] matches directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// One named target.
    Exact,
    /// Every target directly inside a directory.
    Directory,
    /// Every target at or below a directory.
    RecursiveDirectory,
}

/// A GN label pattern such as `//base/*` or `//ios/app:app`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelPattern {
    kind: PatternKind,
    dir: SourceDir,
    name: String,
    toolchain: Option<Label>,
}

struct PatternInput<'a>(&'a str);

impl PatternInput<'_> {
    fn error(&self, reason: &str) -> FilterSyntaxError {
        FilterSyntaxError {
            pattern: self.0.to_owned(),
            reason: reason.to_owned(),
        }
    }
}

impl LabelPattern {
    /// Parse one pattern.
    ///
    /// Relative patterns are resolved against the source root.
    ///
    /// # Errors
    ///
    /// Returns [`FilterSyntaxError`] for empty patterns, misplaced
    /// wildcards, empty names, unbalanced toolchain suffixes and
    /// system-absolute paths.
    ///
    /// # Examples
    ///
    /// ```
    /// use pbxgen::filter::{LabelPattern, PatternKind};
    ///
    /// let pattern = LabelPattern::parse("//ios/*").expect("pattern");
    /// assert_eq!(pattern.kind(), PatternKind::RecursiveDirectory);
    /// ```
    pub fn parse(text: &str) -> Result<Self, FilterSyntaxError> {
        let input = PatternInput(text.trim());
        if input.0.is_empty() {
            return Err(input.error("empty pattern"));
        }
        let (body, toolchain) = split_toolchain(&input)?;
        if body.starts_with('/') && !body.starts_with("//") {
            return Err(input.error("system-absolute paths are not supported"));
        }
        let relative = body.strip_prefix("//").unwrap_or(body);

        let (kind, dir, name) = if let Some((dir, name)) = relative.split_once(':') {
            if dir.contains('*') {
                return Err(input.error("wildcards may only end the pattern"));
            }
            match name {
                "*" => (PatternKind::Directory, dir, ""),
                "" => return Err(input.error("empty target name")),
                n if n.contains('*') => {
                    return Err(input.error("a name wildcard must be the whole name (`:*`)"));
                }
                n => (PatternKind::Exact, dir, n),
            }
        } else if relative == "*" {
            (PatternKind::RecursiveDirectory, "", "")
        } else if let Some(dir) = relative.strip_suffix("/*") {
            if dir.contains('*') {
                return Err(input.error("wildcards may only end the pattern"));
            }
            (PatternKind::RecursiveDirectory, dir, "")
        } else if relative.contains('*') {
            return Err(input.error("wildcards may only end the pattern"));
        } else {
            let last = relative
                .rsplit('/')
                .find(|component| !component.is_empty())
                .ok_or_else(|| input.error("missing directory"))?;
            (PatternKind::Exact, relative, last)
        };

        Ok(Self {
            kind,
            dir: SourceDir::from_components(dir),
            name: name.to_owned(),
            toolchain,
        })
    }

    /// Pattern kind.
    #[must_use]
    pub const fn kind(&self) -> PatternKind {
        self.kind
    }

    /// Whether `label` matches.
    #[must_use]
    pub fn matches(&self, label: &Label) -> bool {
        if let Some(toolchain) = &self.toolchain
            && label.toolchain() != Some(toolchain)
        {
            return false;
        }
        match self.kind {
            PatternKind::Exact => label.dir() == &self.dir && label.name() == self.name,
            PatternKind::Directory => label.dir() == &self.dir,
            PatternKind::RecursiveDirectory => self.dir.contains(label.dir().as_str()),
        }
    }
}

impl FromStr for LabelPattern {
    type Err = FilterSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn split_toolchain<'a>(
    input: &PatternInput<'a>,
) -> Result<(&'a str, Option<Label>), FilterSyntaxError> {
    let text = input.0;
    let Some(stripped) = text.strip_suffix(')') else {
        if text.contains('(') || text.contains(')') {
            return Err(input.error("unbalanced parenthesis"));
        }
        return Ok((text, None));
    };
    let (body, toolchain) = stripped
        .split_once('(')
        .ok_or_else(|| input.error("unbalanced parenthesis"))?;
    if body.contains(')') || toolchain.contains('(') {
        return Err(input.error("unbalanced parenthesis"));
    }
    let label = Label::parse(toolchain).map_err(|e| input.error(&e.to_string()))?;
    Ok((body, Some(label)))
}

/// Parse a `;`-separated pattern list, ignoring empty entries.
///
/// # Errors
///
/// Returns the first [`FilterSyntaxError`].
pub fn parse_filters(filters: &str) -> Result<Vec<LabelPattern>, FilterSyntaxError> {
    filters
        .split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(LabelPattern::parse)
        .collect()
}

/// Choose the targets to materialize.
///
/// Without patterns every target is a candidate. Executables linked into a
/// default-toolchain `bundle_data` target are removed. The result is sorted
/// by label and free of duplicates.
///
/// # Errors
///
/// Returns [`FilterSyntaxError`] when `filters` contains a bad pattern.
pub fn select_targets<'g>(
    graph: &'g BuildGraph,
    filters: Option<&str>,
) -> Result<Vec<&'g Target>, FilterSyntaxError> {
    let patterns = filters.map(parse_filters).transpose()?.unwrap_or_default();
    let candidates: Vec<&Target> = graph
        .targets()
        .iter()
        .filter(|target| patterns.is_empty() || patterns.iter().any(|p| p.matches(&target.label)))
        .collect();

    let mut selected: BTreeMap<&Label, &Target> =
        candidates.iter().map(|target| (&target.label, *target)).collect();
    for target in &candidates {
        if target.output_type != OutputType::BundleData || !graph.is_default_toolchain(target) {
            continue;
        }
        for dep in target.linked_deps() {
            let is_executable = graph
                .target(dep)
                .is_some_and(|t| t.output_type == OutputType::Executable);
            if is_executable && selected.remove(dep).is_some() {
                debug!(executable = %dep, bundle = %target.label, "executable subsumed by bundle data");
            }
        }
    }
    Ok(selected.into_values().collect())
}
