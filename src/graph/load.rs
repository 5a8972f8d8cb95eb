//! Load a [`BuildGraph`] from its YAML description.
//!
//! The description mirrors what a resolved GN build exposes: settings,
//! toolchains, non-target items, targets and the extra files read during
//! resolution. See the crate documentation for the schema.

use super::{
    BuildArgs, BuildGraph, BuildSettings, GraphError, Item, SourceDir, Target, Toolchain,
};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::fs;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GraphDocument {
    root_path: Utf8PathBuf,
    build_dir: SourceDir,
    #[serde(default)]
    args: BuildArgs,
    #[serde(default)]
    toolchains: Vec<Toolchain>,
    #[serde(default)]
    items: Vec<Item>,
    #[serde(default)]
    targets: Vec<Target>,
    #[serde(default)]
    gen_dependencies: Vec<Utf8PathBuf>,
}

fn from_str_named(yaml: &str, name: &str) -> Result<BuildGraph, GraphError> {
    let doc: GraphDocument = serde_saphyr::from_str(yaml).map_err(|e| GraphError::Parse {
        name: name.to_owned(),
        message: e.to_string(),
    })?;
    let settings = BuildSettings {
        root_path: doc.root_path,
        build_dir: doc.build_dir,
        args: doc.args,
    };
    BuildGraph::new(
        settings,
        doc.toolchains,
        doc.items,
        doc.targets,
        doc.gen_dependencies,
    )
}

/// Parse a graph description held in memory.
///
/// # Errors
///
/// Returns [`GraphError::Parse`] for malformed YAML or schema violations and
/// the assembly errors of [`BuildGraph::new`].
pub fn from_str(yaml: &str) -> Result<BuildGraph, GraphError> {
    from_str_named(yaml, "<memory>")
}

/// Read and parse a graph description file.
///
/// # Errors
///
/// Returns [`GraphError::Read`] when the file cannot be read, otherwise the
/// errors of [`from_str`].
pub fn from_path(path: &Utf8Path) -> Result<BuildGraph, GraphError> {
    let data = fs::read_to_string(path).map_err(|source| GraphError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    from_str_named(&data, path.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Label, OutputType};

    const GRAPH: &str = r#"
root_path: /work/src
build_dir: //out/Debug-iphonesimulator
args:
  target_os: ios
toolchains:
  - label: //build/toolchain:clang
    default: true
    tools:
      link:
        default_output_dir: "{{root_out_dir}}"
items:
  - label: //build/config:compiler
    imports: [//build/config/compiler.gni]
targets:
  - label: //app:app
    output_type: create_bundle
    sources: [//app/main.mm]
    public_deps: [//app:lib]
    bundle:
      product_type: com.apple.product-type.application
      root_dir: //out/Debug-iphonesimulator/app.app
  - label: //app:lib
    output_type: source_set
    sources: [//app/lib.mm, //app/lib.h]
gen_dependencies: [/work/src/.gn]
"#;

    #[test]
    fn loads_a_graph_description() {
        let graph = from_str(GRAPH).expect("graph");
        assert_eq!(graph.settings().build_dir.as_str(), "//out/Debug-iphonesimulator/");
        assert_eq!(graph.settings().args.target_os.as_deref(), Some("ios"));
        assert_eq!(graph.targets().len(), 2);
        let app = graph
            .target(&Label::parse("//app:app").expect("label"))
            .expect("app target");
        assert_eq!(app.output_type, OutputType::CreateBundle);
        assert_eq!(app.bundle_product_type(), "com.apple.product-type.application");
        assert!(graph.default_toolchain().is_some());
    }

    #[test]
    fn reports_unknown_fields() {
        let yaml = "root_path: /src\nbuild_dir: //out/\nbogus: 1\n";
        let err = from_str(yaml).expect_err("unknown field");
        assert!(matches!(err, GraphError::Parse { .. }));
    }

    #[test]
    fn reports_bad_labels() {
        let yaml = "root_path: /src\nbuild_dir: //out/\ntargets:\n  - label: app\n    output_type: group\n";
        assert!(from_str(yaml).is_err());
    }
}
