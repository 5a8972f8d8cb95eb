//! Project synthesis.
//!
//! [`XcodeProject::generate`] turns a [`BuildGraph`] into a finished
//! [`PbxProject`] in five phases: collect navigator files, select targets,
//! materialize them, wire test modules to their hosts and assign object
//! identifiers. [`XcodeProject::write_files`] renders and persists the
//! result. Every phase either completes or aborts the run, and nothing is
//! written until generation has succeeded.

pub mod attributes;
mod sources;
mod targets;

pub use attributes::{TargetOs, config_name, project_attributes};
pub use sources::collect_sources;
pub use targets::AGGREGATE_TARGET_NAME;

use crate::error::XcodeError;
use crate::filter::select_targets;
use crate::graph::{BuildGraph, GenDependencies, Label, SourceDir, rebase_path};
use crate::pbx::{CompilerFlags, PbxProject};
use crate::script::ScriptEnvironment;
use crate::status::{PipelineStage, StatusReporter, report_pipeline_stage};
use crate::workspace::{
    WORKSPACE_DATA, WORKSPACE_DATA_PATH, WORKSPACE_SETTINGS_PATH, workspace_settings,
};
use crate::write::{FileWriter, WriteOutcome};
use camino::{Utf8Path, Utf8PathBuf};
use mockable::Env;
use targets::{TargetBuilder, wire_test_modules};
use tracing::{debug, info};

/// Build system the generated project asks the IDE to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum BuildSystem {
    /// The original build system; supports test-file indexing.
    #[default]
    Legacy,
    /// The new build system; test files are not attached.
    New,
}

/// Options of one generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XcodeWriterOptions {
    /// Project name; also the `.xcodeproj` directory name.
    pub project_name: String,
    /// Backend executable embedded in the scripts; empty or `None` means
    /// `ninja`.
    pub ninja_executable: Option<String>,
    /// Target the `All` aggregate builds; empty builds the defaults.
    pub root_target_name: String,
    /// Optional `;`-separated label patterns.
    pub dir_filters: Option<String>,
    /// Build system recorded in the workspace settings.
    pub build_system: BuildSystem,
}

impl Default for XcodeWriterOptions {
    fn default() -> Self {
        Self {
            project_name: String::from("all"),
            ninja_executable: None,
            root_target_name: String::new(),
            dir_filters: None,
            build_system: BuildSystem::Legacy,
        }
    }
}

/// Paths written by [`XcodeProject::write_files`], with their outcomes.
pub type WrittenFiles = Vec<(Utf8PathBuf, WriteOutcome)>;

/// A generated project ready to be written.
#[derive(Debug, Clone)]
pub struct XcodeProject {
    project: PbxProject,
    project_dir: Utf8PathBuf,
    build_system: BuildSystem,
    selected: Vec<Label>,
}

impl XcodeProject {
    /// Generate the project for `graph`.
    ///
    /// `env` supplies the environment captured into the build scripts and
    /// `gen_deps` the extra files read while the graph was built.
    ///
    /// # Errors
    ///
    /// Returns the first [`XcodeError`] raised by any phase.
    pub fn generate<E, G>(
        graph: &BuildGraph,
        gen_deps: &G,
        options: &XcodeWriterOptions,
        env: &E,
        reporter: &dyn StatusReporter,
    ) -> Result<Self, XcodeError>
    where
        E: Env + ?Sized,
        G: GenDependencies + ?Sized,
    {
        let settings = graph.settings();
        let root_src_dir = settings.source_root_from_build_dir()?;
        let mut project = PbxProject::new(
            options.project_name.as_str(),
            config_name(settings),
            root_src_dir.as_str(),
            project_attributes(settings),
        );

        report_pipeline_stage(reporter, PipelineStage::CollectSources);
        let root = SourceDir::root();
        let sources = collect_sources(graph, gen_deps);
        for source in &sources {
            let path = rebase_path(source.as_str(), &root)?;
            project.add_source_file_to_indexing_target(&path, &path, CompilerFlags::None)?;
        }
        debug!(files = sources.len(), "indexed source files");

        report_pipeline_stage(reporter, PipelineStage::SelectTargets);
        let selected = select_targets(graph, options.dir_filters.as_deref())?;
        debug!(targets = selected.len(), "selected targets");

        report_pipeline_stage(reporter, PipelineStage::MaterializeTargets);
        let environment = ScriptEnvironment::capture(env);
        let builder = TargetBuilder {
            graph,
            options,
            environment: &environment,
            root_src_dir: &root_src_dir,
            skip_executables: TargetOs::from_args(&settings.args).skips_executables(),
        };
        builder.add_aggregate(&mut project)?;
        let bundles = builder.materialize(&mut project, &selected)?;

        report_pipeline_stage(reporter, PipelineStage::WireTestModules);
        if options.build_system == BuildSystem::Legacy {
            wire_test_modules(&mut project, graph, &bundles)?;
        } else {
            debug!("new build system: test modules left unwired");
        }

        report_pipeline_stage(reporter, PipelineStage::AssignIdentifiers);
        project.assign_ids()?;

        let project_dir = settings
            .root_path
            .join(settings.build_dir.as_str().trim_start_matches('/'))
            .join(format!("{}.xcodeproj", options.project_name));
        Ok(Self {
            project,
            project_dir,
            build_system: options.build_system,
            selected: selected.into_iter().map(|target| target.label.clone()).collect(),
        })
    }

    /// The generated object graph.
    #[must_use]
    pub const fn pbx(&self) -> &PbxProject {
        &self.project
    }

    /// Absolute path of the `.xcodeproj` directory.
    #[must_use]
    pub fn project_dir(&self) -> &Utf8Path {
        &self.project_dir
    }

    /// Labels chosen by the target filter, sorted.
    #[must_use]
    pub fn selected_targets(&self) -> &[Label] {
        &self.selected
    }

    /// Render `project.pbxproj` and write it with the workspace files.
    ///
    /// # Errors
    ///
    /// Returns [`XcodeError::Object`] if rendering fails and
    /// [`XcodeError::WriteFailure`] for I/O errors.
    pub fn write_files<W>(
        &self,
        writer: &mut W,
        reporter: &dyn StatusReporter,
    ) -> Result<WrittenFiles, XcodeError>
    where
        W: FileWriter + ?Sized,
    {
        report_pipeline_stage(reporter, PipelineStage::WriteFiles);
        let pbxproj = self.project.render()?;
        let settings = workspace_settings(self.build_system);
        let files = [
            (self.project_dir.join("project.pbxproj"), pbxproj.as_str()),
            (self.project_dir.join(WORKSPACE_DATA_PATH), WORKSPACE_DATA),
            (self.project_dir.join(WORKSPACE_SETTINGS_PATH), settings.as_str()),
        ];
        let mut written = Vec::with_capacity(files.len());
        for (path, content) in files {
            let outcome = writer
                .write_if_changed(&path, content)
                .map_err(|source| XcodeError::WriteFailure {
                    path: path.clone(),
                    source,
                })?;
            info!(%path, ?outcome, "project file");
            written.push((path, outcome));
        }
        Ok(written)
    }
}
