//! Tests for loading graph descriptions from disk.

use anyhow::{Context, Result, ensure};
use camino::Utf8PathBuf;
use pbxgen::graph::{GenDependencies, GraphError, ItemKind, OutputType, load};
use rstest::rstest;
use std::fs;
use tempfile::tempdir;
use test_support::graph::{IOS_GRAPH, MAC_GRAPH};
use test_support::{label, load_graph};

#[test]
fn loads_graph_from_file() -> Result<()> {
    let temp = tempdir().context("create temp dir")?;
    let path = Utf8PathBuf::from_path_buf(temp.path().join("graph.yml"))
        .map_err(|p| anyhow::anyhow!("non UTF-8 path {}", p.display()))?;
    fs::write(&path, MAC_GRAPH).context("write graph")?;

    let graph = load::from_path(&path)?;
    ensure!(graph.targets().len() == 2, "expected two targets");
    ensure!(
        graph.gen_dependencies()
            == [
                Utf8PathBuf::from("/work/src/.gn"),
                Utf8PathBuf::from("/work/other/outside.gni")
            ],
        "unexpected gen dependencies {:?}",
        graph.gen_dependencies()
    );
    Ok(())
}

#[test]
fn missing_file_is_a_read_error() {
    let err = load::from_path(camino::Utf8Path::new("/definitely/missing/graph.yml"))
        .expect_err("missing file");
    assert!(matches!(err, GraphError::Read { .. }), "unexpected error {err:?}");
}

#[test]
fn fixture_items_keep_their_kinds() {
    let graph = load_graph(IOS_GRAPH);
    let kinds: Vec<ItemKind> = graph.items().iter().map(|item| item.kind).collect();
    assert_eq!(kinds, [ItemKind::Config, ItemKind::Pool]);
    let module = graph
        .target(&label("//ios/chrome/test:ios_chrome_unittests_module"))
        .expect("module");
    assert_eq!(module.output_type, OutputType::CreateBundle);
    assert_eq!(
        module.bundle.as_ref().map(|b| b.test_application_name.as_str()),
        Some("chrome")
    );
}

#[rstest]
#[case::duplicate_target(
    "targets:\n  - label: //a:a\n    output_type: group\n  - label: //a:a\n    output_type: group\n"
)]
#[case::two_default_toolchains(
    "toolchains:\n  - label: //tc:a\n    default: true\n  - label: //tc:b\n    default: true\n"
)]
#[case::unknown_output_type("targets:\n  - label: //a:a\n    output_type: widget\n")]
#[case::unknown_target_field("targets:\n  - label: //a:a\n    output_type: group\n    colour: red\n")]
fn malformed_graphs_are_rejected(#[case] body: &str) {
    let yaml = format!("root_path: /src\nbuild_dir: //out/\n{body}");
    assert!(load::from_str(&yaml).is_err(), "accepted:\n{yaml}");
}
