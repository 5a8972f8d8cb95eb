//! Collection of the files shown in the project navigator.

use crate::graph::{BuildGraph, GenDependencies, ItemKind, OutputType, SourceFile};
use std::collections::BTreeSet;
use tracing::debug;

/// Every source-tree file the build touched, sorted.
///
/// Covers target sources, config inputs, public headers, action scripts,
/// the build files and imports of targets, configs and toolchains, and the
/// extra files reported by `gen_deps` that lie under the source root.
/// Files inside the build directory and system-absolute paths are left out.
#[must_use]
pub fn collect_sources<G>(graph: &BuildGraph, gen_deps: &G) -> Vec<SourceFile>
where
    G: GenDependencies + ?Sized,
{
    let settings = graph.settings();
    let mut sources = BTreeSet::new();
    let mut include = |file: &SourceFile| {
        let wanted = file.is_source_absolute() && !settings.build_dir.contains(file.as_str());
        if wanted {
            sources.insert(file.clone());
        }
    };

    for target in graph.targets() {
        target
            .sources
            .iter()
            .chain(&target.inputs)
            .chain(&target.public_headers)
            .for_each(&mut include);
        if matches!(
            target.output_type,
            OutputType::Action | OutputType::ActionForeach
        ) && let Some(script) = &target.action_script
        {
            include(script);
        }
        include(&target.build_file());
        target.imports.iter().for_each(&mut include);
    }

    for item in graph.items() {
        if item.kind == ItemKind::Pool {
            continue;
        }
        include(&crate::graph::build_file_for(&item.label));
        item.imports.iter().for_each(&mut include);
    }

    for path in gen_deps.gen_dependencies() {
        match settings.source_file_for(path) {
            Some(file) => include(&file),
            None => debug!(%path, "generator input outside the source root"),
        }
    }

    sources.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{BuildArgs, BuildSettings, Item, Label, SourceDir, Target};
    use camino::Utf8PathBuf;

    fn label(text: &str) -> Label {
        Label::parse(text).expect("label")
    }

    #[test]
    fn collects_sorted_files_and_skips_build_outputs() {
        let mut app = Target::new(label("//app:app"), OutputType::Executable);
        app.sources = vec![
            SourceFile::new("//app/main.cc"),
            SourceFile::new("//out/Debug/gen/app/generated.cc"),
            SourceFile::new("/usr/include/stdio.h"),
        ];
        app.public_headers = vec![SourceFile::new("//app/app.h")];
        app.inputs = vec![SourceFile::new("//app/data.json")];
        let mut action = Target::new(label("//tools:gen"), OutputType::Action);
        action.action_script = Some(SourceFile::new("//tools/gen.py"));
        let mut group = Target::new(label("//tools:group"), OutputType::Group);
        group.action_script = Some(SourceFile::new("//tools/ignored.py"));
        let items = vec![
            Item {
                label: label("//build/config:compiler"),
                kind: ItemKind::Config,
                imports: vec![SourceFile::new("//build/config/compiler.gni")],
            },
            Item {
                label: label("//build/pool:link"),
                kind: ItemKind::Pool,
                imports: vec![],
            },
        ];
        let settings = BuildSettings {
            root_path: Utf8PathBuf::from("/src"),
            build_dir: SourceDir::parse("//out/Debug").expect("dir"),
            args: BuildArgs::default(),
        };
        let graph = BuildGraph::new(
            settings,
            vec![],
            items,
            vec![app, action, group],
            vec![Utf8PathBuf::from("/src/.gn"), Utf8PathBuf::from("/other/x.py")],
        )
        .expect("graph");

        let files: Vec<String> = collect_sources(&graph, &graph)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            files,
            [
                "//.gn",
                "//app/BUILD.gn",
                "//app/app.h",
                "//app/data.json",
                "//app/main.cc",
                "//build/config/BUILD.gn",
                "//build/config/compiler.gni",
                "//tools/BUILD.gn",
                "//tools/gen.py",
            ]
        );
    }
}
