//! Native and aggregate target creation and test-module wiring.

use super::{BuildSystem, XcodeWriterOptions};
use crate::error::XcodeError;
use crate::graph::{
    BuildGraph, BundleData, OutputType, SourceDir, Target, apply_output_dir_pattern,
    final_output_tool_name, rebase_path,
};
use crate::pbx::{
    Attributes, CompilerFlags, EXECUTABLE_FILE_TYPE, NativeTargetSpec, NodeId, PbxProject,
    TOOL_PRODUCT_TYPE,
};
use crate::script::{ScriptEnvironment, build_script, ninja_executable_or_default};
use crate::xctest::{
    TestFilesResolver, XCTEST_MODULE_SUFFIX, find_application_target, is_test_module_target,
    is_xcuitest_module_target, is_xcuitest_runner_target,
};
use tracing::debug;

/// Name of the aggregate target building the root target.
pub const AGGREGATE_TARGET_NAME: &str = "All";

/// Shared inputs of target materialization.
pub(super) struct TargetBuilder<'a> {
    pub(super) graph: &'a BuildGraph,
    pub(super) options: &'a XcodeWriterOptions,
    pub(super) environment: &'a ScriptEnvironment,
    pub(super) root_src_dir: &'a str,
    pub(super) skip_executables: bool,
}

impl TargetBuilder<'_> {
    fn script(&self, target_name: &str) -> Result<String, XcodeError> {
        let ninja = ninja_executable_or_default(self.options.ninja_executable.as_deref());
        build_script(target_name, ninja, self.root_src_dir, self.environment).map_err(|source| {
            XcodeError::Template {
                target: target_name.to_owned(),
                source,
            }
        })
    }

    fn build_dir(&self) -> &SourceDir {
        &self.graph.settings().build_dir
    }

    /// Add the `All` aggregate target.
    pub(super) fn add_aggregate(&self, project: &mut PbxProject) -> Result<NodeId, XcodeError> {
        let script = self.script(&self.options.root_target_name)?;
        Ok(project.add_aggregate_target(AGGREGATE_TARGET_NAME, script))
    }

    /// Materialize the selected targets, returning the bundles created in
    /// label order.
    pub(super) fn materialize<'g>(
        &self,
        project: &mut PbxProject,
        targets: &[&'g Target],
    ) -> Result<Vec<(&'g Target, NodeId)>, XcodeError> {
        let mut bundles = Vec::new();
        for &target in targets {
            match target.output_type {
                OutputType::Executable if self.skip_executables => {
                    debug!(target = %target.label, "executable skipped for mobile target OS");
                }
                OutputType::Executable => {
                    self.add_executable(project, target)?;
                }
                OutputType::CreateBundle => {
                    let Some(bundle) = target
                        .bundle
                        .as_ref()
                        .filter(|bundle| !bundle.product_type.is_empty())
                    else {
                        debug!(target = %target.label, "bundle without product type skipped");
                        continue;
                    };
                    if is_xcuitest_runner_target(target) {
                        debug!(target = %target.label, "UI test runner skipped");
                        continue;
                    }
                    let node = self.add_bundle(project, target, bundle)?;
                    bundles.push((target, node));
                }
                _ => {}
            }
        }
        Ok(bundles)
    }

    fn add_executable(
        &self,
        project: &mut PbxProject,
        target: &Target,
    ) -> Result<NodeId, XcodeError> {
        let output_dir = match &target.output_dir {
            Some(dir) => rebase_path(dir.as_str(), self.build_dir())?,
            None => self.default_output_dir(target)?,
        };
        let name = target.label.name();
        let spec = NativeTargetSpec {
            name: name.to_owned(),
            file_type: Some(EXECUTABLE_FILE_TYPE.to_owned()),
            output_name: target
                .output_name
                .as_deref()
                .filter(|output| !output.is_empty())
                .unwrap_or(name)
                .to_owned(),
            product_type: TOOL_PRODUCT_TYPE.to_owned(),
            output_dir,
            shell_script: self.script(name)?,
            extra_attributes: Attributes::new(),
        };
        debug!(target = %target.label, "adding executable target");
        Ok(project.add_native_target(spec))
    }

    fn default_output_dir(&self, target: &Target) -> Result<String, XcodeError> {
        let toolchain = self.graph.toolchain_for(target);
        let tool = toolchain.and_then(|tc| tc.tool_for_final_output(target.output_type));
        let Some(tool) = tool else {
            return Err(XcodeError::MissingToolForOutput {
                location: target.location(),
                tool: final_output_tool_name(target.output_type)
                    .unwrap_or("link")
                    .to_owned(),
                toolchain: toolchain.map_or_else(
                    || String::from("<none>"),
                    |tc| tc.label.user_visible_name(),
                ),
                target: target.label.user_visible_name(),
            });
        };
        let qualifier = if self.graph.is_default_toolchain(target) {
            None
        } else {
            target.label.toolchain()
        };
        Ok(apply_output_dir_pattern(
            &tool.default_output_dir,
            target,
            qualifier,
        )?)
    }

    fn add_bundle(
        &self,
        project: &mut PbxProject,
        target: &Target,
        bundle: &BundleData,
    ) -> Result<NodeId, XcodeError> {
        let label_name = target.label.name();
        let name = if is_xcuitest_module_target(target) {
            label_name
                .rfind(XCTEST_MODULE_SUFFIX)
                .and_then(|end| label_name.get(..end))
                .unwrap_or(label_name)
        } else {
            label_name
        };

        let mut extra_attributes = bundle.extra_attributes.clone();
        if self.options.build_system == BuildSystem::Legacy {
            extra_attributes.insert(String::from("CODE_SIGN_IDENTITY"), String::new());
        }
        let spec = NativeTargetSpec {
            name: name.to_owned(),
            file_type: None,
            output_name: bundle.root_output(self.build_dir())?,
            product_type: bundle.product_type.clone(),
            output_dir: bundle.output_dir(self.build_dir())?,
            shell_script: self.script(name)?,
            extra_attributes,
        };
        debug!(target = %target.label, name, "adding bundle target");
        Ok(project.add_native_target(spec))
    }
}

/// Attach test files to every test module and make it depend on its host.
///
/// Unit-test modules index the test files of their host application; UI-test
/// modules index their own. The files are added with compilation suppressed.
pub(super) fn wire_test_modules(
    project: &mut PbxProject,
    graph: &BuildGraph,
    bundles: &[(&Target, NodeId)],
) -> Result<(), XcodeError> {
    let mut resolver = TestFilesResolver::new(graph);
    let root = SourceDir::root();
    for &(module, module_node) in bundles {
        if !is_test_module_target(module) {
            continue;
        }
        let host_name = module
            .bundle
            .as_ref()
            .map_or("", |bundle| bundle.test_application_name.as_str());
        let &(host, host_node) = find_application_target(module, host_name, bundles)?;

        let files_owner = if is_xcuitest_module_target(module) {
            module
        } else {
            host
        };
        let files = resolver.search_files_for_target(&files_owner.label)?;
        let paths = files
            .iter()
            .map(|file| rebase_path(file.as_str(), &root))
            .collect::<Result<Vec<_>, _>>()?;
        for path in &paths {
            project.add_source_file(path, path, CompilerFlags::Help, module_node)?;
        }
        project.add_dependency(host_node, module_node)?;
        debug!(module = %module.label, host = %host.label, files = paths.len(), "wired test module");
    }
    debug!(evaluations = resolver.evaluations(), "test file search finished");
    Ok(())
}
