//! Resolved targets and non-target items.

use super::label::Label;
use super::source::{PathError, SourceDir, SourceFile, rebase_path};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of artefact a target produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputType {
    /// A linked executable.
    Executable,
    /// An Apple bundle assembled from `bundle_data` targets.
    CreateBundle,
    /// Files copied into a bundle.
    BundleData,
    /// A script run once.
    Action,
    /// A script run once per source.
    ActionForeach,
    /// A dependency-only grouping.
    Group,
    /// A shared library.
    SharedLibrary,
    /// A static library.
    StaticLibrary,
    /// A loadable module.
    LoadableModule,
    /// Object files without a link step.
    SourceSet,
    /// A file copy.
    Copy,
    /// A file written at generation time.
    GeneratedFile,
}

/// Bundle description carried by `create_bundle` targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BundleData {
    /// Apple product type, e.g. `com.apple.product-type.application`.
    #[serde(default)]
    pub product_type: String,
    /// Directory the bundle is assembled in, e.g. `//out/Debug/App.app`.
    pub root_dir: SourceDir,
    /// Host application name for test bundles.
    #[serde(default)]
    pub test_application_name: String,
    /// Extra build settings for the generated native target.
    #[serde(default)]
    pub extra_attributes: BTreeMap<String, String>,
}

impl BundleData {
    /// The bundle directory relative to `build_dir`, e.g. `App.app`.
    ///
    /// # Errors
    ///
    /// Propagates [`PathError`] from [`rebase_path`].
    pub fn root_output(&self, build_dir: &SourceDir) -> Result<String, PathError> {
        rebase_path(self.root_dir.as_str(), build_dir)
    }

    /// The directory holding the bundle, relative to `build_dir`.
    ///
    /// # Errors
    ///
    /// Propagates [`PathError`] from [`rebase_path`].
    pub fn output_dir(&self, build_dir: &SourceDir) -> Result<String, PathError> {
        rebase_path(self.root_dir.parent().as_str(), build_dir)
    }
}

/// A resolved target.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Target {
    /// Label, qualified by toolchain when not in the default toolchain.
    pub label: Label,
    /// Artefact kind.
    pub output_type: OutputType,
    /// Compiled and listed sources.
    #[serde(default)]
    pub sources: Vec<SourceFile>,
    /// Public headers.
    #[serde(default)]
    pub public_headers: Vec<SourceFile>,
    /// Inputs contributed by configs.
    #[serde(default)]
    pub inputs: Vec<SourceFile>,
    /// Script run by action targets.
    #[serde(default)]
    pub action_script: Option<SourceFile>,
    /// Dependencies propagated to dependants.
    #[serde(default)]
    pub public_deps: Vec<Label>,
    /// Dependencies private to this target.
    #[serde(default)]
    pub private_deps: Vec<Label>,
    /// Run-time only dependencies.
    #[serde(default)]
    pub data_deps: Vec<Label>,
    /// Output file name override.
    #[serde(default)]
    pub output_name: Option<String>,
    /// Output directory override.
    #[serde(default)]
    pub output_dir: Option<SourceDir>,
    /// Bundle description for `create_bundle` targets.
    #[serde(default)]
    pub bundle: Option<BundleData>,
    /// Files imported by the build file defining this target.
    #[serde(default)]
    pub imports: Vec<SourceFile>,
    /// Where the target is defined, used in diagnostics.
    #[serde(default)]
    pub defined_from: Option<String>,
}

impl Target {
    /// Create a target with no sources or dependencies.
    #[must_use]
    pub const fn new(label: Label, output_type: OutputType) -> Self {
        Self {
            label,
            output_type,
            sources: Vec::new(),
            public_headers: Vec::new(),
            inputs: Vec::new(),
            action_script: None,
            public_deps: Vec::new(),
            private_deps: Vec::new(),
            data_deps: Vec::new(),
            output_name: None,
            output_dir: None,
            bundle: None,
            imports: Vec::new(),
            defined_from: None,
        }
    }

    /// Public then private dependencies.
    pub fn linked_deps(&self) -> impl Iterator<Item = &Label> {
        self.public_deps.iter().chain(&self.private_deps)
    }

    /// Bundle product type, or the empty string for non-bundles.
    #[must_use]
    pub fn bundle_product_type(&self) -> &str {
        self.bundle.as_ref().map_or("", |b| b.product_type.as_str())
    }

    /// Source location used in diagnostics.
    #[must_use]
    pub fn location(&self) -> String {
        self.defined_from
            .clone()
            .unwrap_or_else(|| format!("{}BUILD.gn", self.label.dir()))
    }

    /// The build file defining this target.
    #[must_use]
    pub fn build_file(&self) -> SourceFile {
        build_file_for(&self.label)
    }
}

/// Kind of a non-target item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// A `config()` definition.
    #[default]
    Config,
    /// A `toolchain()` definition.
    Toolchain,
    /// A `pool()` definition.
    Pool,
}

/// A resolved item that is not a target.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Item {
    /// Item label.
    pub label: Label,
    /// Item kind.
    #[serde(default)]
    pub kind: ItemKind,
    /// Files imported by the defining build file.
    #[serde(default)]
    pub imports: Vec<SourceFile>,
}

/// The `BUILD.gn` file defining `label`.
#[must_use]
pub fn build_file_for(label: &Label) -> SourceFile {
    SourceFile::new(format!("{}BUILD.gn", label.dir()))
}
