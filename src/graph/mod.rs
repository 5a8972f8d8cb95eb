//! The resolved build graph consumed by the project generator.
//!
//! The graph is read-only input: targets with their sources and dependency
//! edges, non-target items, toolchains and the build settings. It is loaded
//! from a YAML description by [`load`] or built directly in tests.

pub mod label;
pub mod load;
pub mod source;
pub mod target;
pub mod toolchain;

pub use label::{Label, LabelError};
pub use source::{PathError, SourceDir, SourceFile, rebase_path};
pub use target::{BundleData, Item, ItemKind, OutputType, Target, build_file_for};
pub use toolchain::{Tool, Toolchain, apply_output_dir_pattern, final_output_tool_name};

use camino::{Utf8Path, Utf8PathBuf};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while loading or assembling a [`BuildGraph`].
#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    /// The graph description could not be read.
    #[error("failed to read build graph `{path}`")]
    #[diagnostic(code(pbxgen::graph::read))]
    Read {
        /// Path of the description file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The graph description is not valid YAML for the expected schema.
    #[error("failed to parse build graph `{name}`: {message}")]
    #[diagnostic(
        code(pbxgen::graph::parse),
        help("check the description against the documented graph format")
    )]
    Parse {
        /// Display name of the description.
        name: String,
        /// Parser message.
        message: String,
    },
    /// Two targets share a label.
    #[error("target `{label}` is defined more than once")]
    #[diagnostic(code(pbxgen::graph::duplicate_target))]
    DuplicateTarget {
        /// Repeated label.
        label: String,
    },
    /// More than one toolchain is marked as default.
    #[error("toolchains `{first}` and `{second}` are both marked default")]
    #[diagnostic(code(pbxgen::graph::multiple_default_toolchains))]
    MultipleDefaultToolchains {
        /// First default toolchain.
        first: String,
        /// Second default toolchain.
        second: String,
    },
}

/// Arguments of the build that affect project generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BuildArgs {
    /// Value of the `target_os` build argument.
    #[serde(default)]
    pub target_os: Option<String>,
}

/// Global settings of the build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildSettings {
    /// Absolute path of the source root.
    pub root_path: Utf8PathBuf,
    /// Build output directory, e.g. `//out/Debug/`.
    pub build_dir: SourceDir,
    /// Build arguments.
    pub args: BuildArgs,
}

impl BuildSettings {
    /// Absolute path of a source-absolute file.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::NotSourceAbsolute`] for system-absolute input.
    pub fn full_path(&self, file: &SourceFile) -> Result<Utf8PathBuf, PathError> {
        let relative =
            file.as_str()
                .strip_prefix("//")
                .ok_or_else(|| PathError::NotSourceAbsolute {
                    path: file.as_str().to_owned(),
                })?;
        Ok(self.root_path.join(relative))
    }

    /// Convert an absolute path below the source root to a source file.
    #[must_use]
    pub fn source_file_for(&self, path: &Utf8Path) -> Option<SourceFile> {
        let relative = path.strip_prefix(&self.root_path).ok()?;
        Some(SourceFile::new(format!("//{relative}")))
    }

    /// The source root expressed relative to the build directory.
    ///
    /// # Errors
    ///
    /// Propagates [`PathError`] from [`rebase_path`].
    pub fn source_root_from_build_dir(&self) -> Result<String, PathError> {
        rebase_path("//", &self.build_dir)
    }
}

/// Files read while the graph was constructed that are not attached to any
/// item, such as `.gn` or `exec_script` inputs.
pub trait GenDependencies {
    /// Absolute paths of the extra files.
    fn gen_dependencies(&self) -> &[Utf8PathBuf];
}

impl GenDependencies for [Utf8PathBuf] {
    fn gen_dependencies(&self) -> &[Utf8PathBuf] {
        self
    }
}

impl GenDependencies for Vec<Utf8PathBuf> {
    fn gen_dependencies(&self) -> &[Utf8PathBuf] {
        self
    }
}

/// A resolved build graph with label lookup.
#[derive(Debug, Clone)]
pub struct BuildGraph {
    settings: BuildSettings,
    toolchains: Vec<Toolchain>,
    items: Vec<Item>,
    targets: Vec<Target>,
    gen_dependencies: Vec<Utf8PathBuf>,
    index: HashMap<Label, usize>,
}

impl BuildGraph {
    /// Assemble a graph and index its targets by label.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateTarget`] when two targets share a label
    /// and [`GraphError::MultipleDefaultToolchains`] when more than one
    /// toolchain claims to be the default.
    pub fn new(
        settings: BuildSettings,
        toolchains: Vec<Toolchain>,
        items: Vec<Item>,
        targets: Vec<Target>,
        gen_dependencies: Vec<Utf8PathBuf>,
    ) -> Result<Self, GraphError> {
        let mut defaults = toolchains.iter().filter(|tc| tc.default);
        if let (Some(first), Some(second)) = (defaults.next(), defaults.next()) {
            return Err(GraphError::MultipleDefaultToolchains {
                first: first.label.to_string(),
                second: second.label.to_string(),
            });
        }

        let mut index = HashMap::with_capacity(targets.len());
        for (position, target) in targets.iter().enumerate() {
            if index.insert(target.label.clone(), position).is_some() {
                return Err(GraphError::DuplicateTarget {
                    label: target.label.to_string(),
                });
            }
        }
        Ok(Self {
            settings,
            toolchains,
            items,
            targets,
            gen_dependencies,
            index,
        })
    }

    /// Build settings.
    #[must_use]
    pub const fn settings(&self) -> &BuildSettings {
        &self.settings
    }

    /// All targets in definition order.
    #[must_use]
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Non-target items.
    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// All toolchains.
    #[must_use]
    pub fn toolchains(&self) -> &[Toolchain] {
        &self.toolchains
    }

    /// Look up a target by label.
    #[must_use]
    pub fn target(&self, label: &Label) -> Option<&Target> {
        self.index
            .get(label)
            .and_then(|&position| self.targets.get(position))
    }

    /// The toolchain marked as default, if any.
    #[must_use]
    pub fn default_toolchain(&self) -> Option<&Toolchain> {
        self.toolchains.iter().find(|tc| tc.default)
    }

    /// Whether `target` belongs to the default toolchain.
    #[must_use]
    pub fn is_default_toolchain(&self, target: &Target) -> bool {
        target.label.toolchain().is_none_or(|tc| {
            self.default_toolchain()
                .is_some_and(|default| default.label.clone().without_toolchain() == *tc)
        })
    }

    /// The toolchain `target` is built with.
    #[must_use]
    pub fn toolchain_for(&self, target: &Target) -> Option<&Toolchain> {
        match target.label.toolchain() {
            None => self.default_toolchain(),
            Some(label) => self
                .toolchains
                .iter()
                .find(|tc| tc.label.clone().without_toolchain() == *label),
        }
    }
}

impl GenDependencies for BuildGraph {
    fn gen_dependencies(&self) -> &[Utf8PathBuf] {
        &self.gen_dependencies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> BuildSettings {
        BuildSettings {
            root_path: Utf8PathBuf::from("/src"),
            build_dir: SourceDir::parse("//out/Debug").expect("dir"),
            args: BuildArgs::default(),
        }
    }

    fn toolchain(text: &str, default: bool) -> Toolchain {
        Toolchain {
            label: Label::parse(text).expect("label"),
            default,
            tools: std::collections::BTreeMap::new(),
        }
    }

    #[test]
    fn rejects_duplicate_targets() {
        let label = Label::parse("//a:a").expect("label");
        let targets = vec![
            Target::new(label.clone(), OutputType::Group),
            Target::new(label, OutputType::Group),
        ];
        let err = BuildGraph::new(settings(), vec![], vec![], targets, vec![]).expect_err("dup");
        assert!(matches!(err, GraphError::DuplicateTarget { .. }));
    }

    #[test]
    fn rejects_two_default_toolchains() {
        let toolchains = vec![toolchain("//tc:a", true), toolchain("//tc:b", true)];
        let err = BuildGraph::new(settings(), toolchains, vec![], vec![], vec![]).expect_err("tc");
        assert!(matches!(err, GraphError::MultipleDefaultToolchains { .. }));
    }

    #[test]
    fn resolves_target_toolchains() {
        let toolchains = vec![toolchain("//tc:default", true), toolchain("//tc:host", false)];
        let plain = Target::new(Label::parse("//a:a").expect("label"), OutputType::Executable);
        let host = Target::new(
            Label::parse("//a:a(//tc:host)").expect("label"),
            OutputType::Executable,
        );
        let explicit_default = Target::new(
            Label::parse("//b:b(//tc:default)").expect("label"),
            OutputType::Executable,
        );
        let graph = BuildGraph::new(
            settings(),
            toolchains,
            vec![],
            vec![plain.clone(), host.clone(), explicit_default.clone()],
            vec![],
        )
        .expect("graph");
        assert!(graph.is_default_toolchain(&plain));
        assert!(graph.is_default_toolchain(&explicit_default));
        assert!(!graph.is_default_toolchain(&host));
        assert_eq!(
            graph.toolchain_for(&host).map(|tc| tc.label.name()),
            Some("host")
        );
    }

    #[test]
    fn maps_paths_under_the_source_root() {
        let settings = settings();
        assert_eq!(
            settings
                .source_file_for(Utf8Path::new("/src/build/config.gni"))
                .map(|f| f.to_string()),
            Some(String::from("//build/config.gni"))
        );
        assert!(settings.source_file_for(Utf8Path::new("/elsewhere/x")).is_none());
        assert_eq!(settings.source_root_from_build_dir().expect("root"), "../..");
    }
}
