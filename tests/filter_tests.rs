//! Target selection over a loaded graph.

use pbxgen::filter::select_targets;
use pbxgen::graph::BuildGraph;
use rstest::{fixture, rstest};
use test_support::load_graph;

const GRAPH: &str = r#"
root_path: /work/src
build_dir: //out/Debug
toolchains:
  - label: //build/toolchain:clang
    default: true
  - label: //build/toolchain:host
targets:
  - label: //app:app_bundle_data
    output_type: bundle_data
    public_deps: [//app:helper]
  - label: //app:helper
    output_type: executable
  - label: //app:app
    output_type: create_bundle
    bundle:
      product_type: com.apple.product-type.application
      root_dir: //out/Debug/App.app
  - label: //tools:tool
    output_type: executable
  - label: //tools:host_data(//build/toolchain:host)
    output_type: bundle_data
    private_deps: [//tools:tool]
"#;

#[fixture]
fn graph() -> BuildGraph {
    load_graph(GRAPH)
}

fn selected(graph: &BuildGraph, filters: Option<&str>) -> Vec<String> {
    select_targets(graph, filters)
        .expect("valid filters")
        .into_iter()
        .map(|target| target.label.to_string())
        .collect()
}

#[rstest]
fn bundle_data_subsumes_linked_executables(graph: BuildGraph) {
    assert_eq!(
        selected(&graph, None),
        [
            "//app:app",
            "//app:app_bundle_data",
            "//tools:host_data(//build/toolchain:host)",
            "//tools:tool",
        ]
    );
}

#[rstest]
#[case(Some(""))]
#[case(Some(" ; "))]
fn empty_filter_lists_select_everything(graph: BuildGraph, #[case] filters: Option<&str>) {
    assert_eq!(selected(&graph, filters), selected(&graph, None));
}

#[rstest]
fn executables_survive_when_their_bundle_data_is_filtered_out(graph: BuildGraph) {
    assert_eq!(selected(&graph, Some("//app:helper;//app:app")), ["//app:app", "//app:helper"]);
}

#[rstest]
fn overlapping_patterns_do_not_duplicate(graph: BuildGraph) {
    assert_eq!(
        selected(&graph, Some("//tools:*;//tools:tool;*")),
        selected(&graph, None)
    );
}
