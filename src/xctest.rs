//! Test target conventions and test-file collection.
//!
//! Test modules are `create_bundle` targets whose names end in `_module`.
//! Unit-test modules run inside a host application and take their test files
//! from it; UI-test modules drive a separate runner application (named with
//! a `_runner` suffix, never materialized) and carry their own test files.

use crate::error::XcodeError;
use crate::graph::{BuildGraph, Label, OutputType, SourceFile, Target};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Suffixes identifying test source files.
pub const XCTEST_FILE_SUFFIXES: [&str; 4] = ["egtest.m", "egtest.mm", "xctest.m", "xctest.mm"];

/// Name suffix of test module targets.
pub const XCTEST_MODULE_SUFFIX: &str = "_module";

/// Name suffix of UI-test runner applications.
pub const XCUITEST_RUNNER_SUFFIX: &str = "_runner";

/// Product type of application bundles.
pub const APPLICATION_PRODUCT_TYPE: &str = "com.apple.product-type.application";

/// Product type of unit-test bundles.
pub const UNIT_TEST_PRODUCT_TYPE: &str = "com.apple.product-type.bundle.unit-test";

/// Product type of UI-test bundles.
pub const UI_TEST_PRODUCT_TYPE: &str = "com.apple.product-type.bundle.ui-testing";

fn is_bundle_of_type(target: &Target, product_type: &str) -> bool {
    target.output_type == OutputType::CreateBundle && target.bundle_product_type() == product_type
}

/// Whether `target` is an application bundle.
#[must_use]
pub fn is_application_target(target: &Target) -> bool {
    is_bundle_of_type(target, APPLICATION_PRODUCT_TYPE)
}

/// Whether `target` is a UI-test runner application.
#[must_use]
pub fn is_xcuitest_runner_target(target: &Target) -> bool {
    is_application_target(target) && target.label.name().ends_with(XCUITEST_RUNNER_SUFFIX)
}

/// Whether `target` is a unit-test module.
#[must_use]
pub fn is_xctest_module_target(target: &Target) -> bool {
    is_bundle_of_type(target, UNIT_TEST_PRODUCT_TYPE)
        && target.label.name().ends_with(XCTEST_MODULE_SUFFIX)
}

/// Whether `target` is a UI-test module.
#[must_use]
pub fn is_xcuitest_module_target(target: &Target) -> bool {
    is_bundle_of_type(target, UI_TEST_PRODUCT_TYPE)
        && target.label.name().ends_with(XCTEST_MODULE_SUFFIX)
}

/// Whether `target` is a unit- or UI-test module.
#[must_use]
pub fn is_test_module_target(target: &Target) -> bool {
    is_xctest_module_target(target) || is_xcuitest_module_target(target)
}

/// Whether `file` is a test source.
#[must_use]
pub fn is_xctest_file(file: &SourceFile) -> bool {
    XCTEST_FILE_SUFFIXES
        .iter()
        .any(|suffix| file.as_str().ends_with(suffix))
}

/// Find the application bundle named `host` among materialized bundles.
///
/// `bundles` is searched in order and matched by label name.
///
/// # Errors
///
/// Returns [`XcodeError::NotAnApplicationBundle`] when the match is not an
/// application and [`XcodeError::HostApplicationNotFound`] when nothing
/// matches.
pub fn find_application_target<'b, 'g, N>(
    module: &Target,
    host: &str,
    bundles: &'b [(&'g Target, N)],
) -> Result<&'b (&'g Target, N), XcodeError> {
    let found = bundles
        .iter()
        .find(|(candidate, _)| candidate.label.name() == host)
        .ok_or_else(|| XcodeError::HostApplicationNotFound {
            location: module.location(),
            module: module.label.to_string(),
            host: host.to_owned(),
        })?;
    if !is_application_target(found.0) {
        return Err(XcodeError::NotAnApplicationBundle {
            location: module.location(),
            host: host.to_owned(),
        });
    }
    Ok(found)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum VisitState {
    Visiting,
    Visited,
}

/// Collects the test files reachable from a target through its linked
/// dependencies, memoizing per label.
#[derive(Debug)]
pub struct TestFilesResolver<'g> {
    graph: &'g BuildGraph,
    states: HashMap<Label, VisitState>,
    cache: HashMap<Label, BTreeSet<SourceFile>>,
    stack: Vec<Label>,
    evaluations: usize,
}

static NO_FILES: BTreeSet<SourceFile> = BTreeSet::new();

impl<'g> TestFilesResolver<'g> {
    /// Create a resolver over `graph` with an empty cache.
    #[must_use]
    pub fn new(graph: &'g BuildGraph) -> Self {
        Self {
            graph,
            states: HashMap::new(),
            cache: HashMap::new(),
            stack: Vec::new(),
            evaluations: 0,
        }
    }

    /// Test files of `label` and of everything it links against.
    ///
    /// Unknown labels yield an empty set.
    ///
    /// # Errors
    ///
    /// Returns [`XcodeError::DependencyCycle`] if the walk reaches a label
    /// that is still being evaluated.
    pub fn search_files_for_target(
        &mut self,
        label: &Label,
    ) -> Result<&BTreeSet<SourceFile>, XcodeError> {
        self.visit(label)?;
        Ok(self.cache.get(label).unwrap_or(&NO_FILES))
    }

    /// Number of targets whose closure has been computed.
    #[must_use]
    pub const fn evaluations(&self) -> usize {
        self.evaluations
    }

    fn visit(&mut self, label: &Label) -> Result<(), XcodeError> {
        match self.states.get(label) {
            Some(VisitState::Visited) => return Ok(()),
            Some(VisitState::Visiting) => {
                let start = self.stack.iter().position(|l| l == label).unwrap_or(0);
                let cycle = self
                    .stack
                    .iter()
                    .skip(start)
                    .chain(std::iter::once(label))
                    .map(ToString::to_string)
                    .collect();
                return Err(XcodeError::DependencyCycle { cycle });
            }
            None => {}
        }

        let graph = self.graph;
        let Some(target) = graph.target(label) else {
            debug!(target = %label, "dependency missing from graph; no test files");
            self.states.insert(label.clone(), VisitState::Visited);
            return Ok(());
        };

        self.states.insert(label.clone(), VisitState::Visiting);
        self.stack.push(label.clone());
        let mut files: BTreeSet<SourceFile> = target
            .sources
            .iter()
            .filter(|file| is_xctest_file(file))
            .cloned()
            .collect();
        for dep in target.linked_deps() {
            self.visit(dep)?;
            if let Some(dep_files) = self.cache.get(dep) {
                files.extend(dep_files.iter().cloned());
            }
        }
        self.stack.pop();

        self.evaluations = self.evaluations.saturating_add(1);
        debug!(target = %label, files = files.len(), "collected test files");
        self.cache.insert(label.clone(), files);
        self.states.insert(label.clone(), VisitState::Visited);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{BuildArgs, BuildSettings, BundleData, SourceDir};
    use camino::Utf8PathBuf;
    use rstest::rstest;

    fn label(text: &str) -> Label {
        Label::parse(text).expect("label")
    }

    fn library(name: &str, sources: &[&str], deps: &[&str]) -> Target {
        let mut target = Target::new(label(name), OutputType::SourceSet);
        target.sources = sources.iter().map(|s| SourceFile::new(*s)).collect();
        target.public_deps = deps.iter().map(|d| label(d)).collect();
        target
    }

    fn bundle(name: &str, product_type: &str) -> Target {
        let mut target = Target::new(label(name), OutputType::CreateBundle);
        target.bundle = Some(BundleData {
            product_type: product_type.to_owned(),
            root_dir: SourceDir::parse("//out/Debug/x.app").expect("dir"),
            ..BundleData::default()
        });
        target
    }

    fn graph(targets: Vec<Target>) -> BuildGraph {
        let settings = BuildSettings {
            root_path: Utf8PathBuf::from("/src"),
            build_dir: SourceDir::parse("//out/Debug").expect("dir"),
            args: BuildArgs::default(),
        };
        BuildGraph::new(settings, vec![], vec![], targets, vec![]).expect("graph")
    }

    #[rstest]
    #[case("//a/foo_xctest.mm", true)]
    #[case("//a/foo_egtest.m", true)]
    #[case("//a/foo_XCTest.mm", false)]
    #[case("//a/foo_xctest.h", false)]
    fn recognises_test_files(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(is_xctest_file(&SourceFile::new(path)), expected);
    }

    #[test]
    fn classifies_test_targets() {
        let unit = bundle("//t:unit_module", UNIT_TEST_PRODUCT_TYPE);
        let ui = bundle("//t:ui_module", UI_TEST_PRODUCT_TYPE);
        let runner = bundle("//t:ui_runner", APPLICATION_PRODUCT_TYPE);
        let misnamed = bundle("//t:unit", UNIT_TEST_PRODUCT_TYPE);
        assert!(is_xctest_module_target(&unit) && is_test_module_target(&unit));
        assert!(is_xcuitest_module_target(&ui) && is_test_module_target(&ui));
        assert!(is_xcuitest_runner_target(&runner));
        assert!(!is_test_module_target(&misnamed));
    }

    #[test]
    fn closure_includes_dependencies_and_is_memoized() {
        let graph = graph(vec![
            library("//a:a", &["//a/a_xctest.mm", "//a/a.mm"], &["//b:b", "//c:c"]),
            library("//b:b", &["//b/b_egtest.mm"], &["//c:c"]),
            library("//c:c", &["//c/c_xctest.m"], &["//missing:dep"]),
        ]);
        let mut resolver = TestFilesResolver::new(&graph);
        let b_files = resolver
            .search_files_for_target(&label("//b:b"))
            .expect("b")
            .clone();
        let a_files = resolver
            .search_files_for_target(&label("//a:a"))
            .expect("a")
            .clone();
        assert!(b_files.is_subset(&a_files));
        let names: Vec<&str> = a_files.iter().map(SourceFile::as_str).collect();
        assert_eq!(names, ["//a/a_xctest.mm", "//b/b_egtest.mm", "//c/c_xctest.m"]);
        // b and c computed once each even though both a and b reach c.
        assert_eq!(resolver.evaluations(), 3);
        resolver.search_files_for_target(&label("//a:a")).expect("a again");
        assert_eq!(resolver.evaluations(), 3);
    }

    #[test]
    fn reports_dependency_cycles() {
        let graph = graph(vec![
            library("//a:a", &[], &["//b:b"]),
            library("//b:b", &[], &["//a:a"]),
        ]);
        let mut resolver = TestFilesResolver::new(&graph);
        let err = resolver
            .search_files_for_target(&label("//a:a"))
            .expect_err("cycle");
        match err {
            XcodeError::DependencyCycle { cycle } => {
                assert_eq!(cycle, ["//a:a", "//b:b", "//a:a"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn host_lookup_distinguishes_missing_and_non_application() {
        let module = bundle("//t:unit_module", UNIT_TEST_PRODUCT_TYPE);
        let host = bundle("//t:host", APPLICATION_PRODUCT_TYPE);
        let other = bundle("//t:other", UNIT_TEST_PRODUCT_TYPE);
        let bundles = [(&host, 1_u8), (&other, 2_u8)];

        let found = find_application_target(&module, "host", &bundles).expect("host");
        assert_eq!(found.1, 1);
        assert!(matches!(
            find_application_target(&module, "other", &bundles),
            Err(XcodeError::NotAnApplicationBundle { .. })
        ));
        assert!(matches!(
            find_application_target(&module, "absent", &bundles),
            Err(XcodeError::HostApplicationNotFound { .. })
        ));
    }
}
