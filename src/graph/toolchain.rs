//! Toolchains and output directory patterns.

use super::label::Label;
use super::source::PathError;
use super::target::{OutputType, Target};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A tool definition; only its default output directory is needed here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Tool {
    /// Output directory pattern, e.g. `{{root_out_dir}}`.
    #[serde(default)]
    pub default_output_dir: String,
}

/// A resolved toolchain.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Toolchain {
    /// Toolchain label.
    pub label: Label,
    /// Whether targets without a toolchain qualification belong here.
    #[serde(default)]
    pub default: bool,
    /// Tools keyed by name (`link`, `solink`, `alink`, ...).
    #[serde(default)]
    pub tools: BTreeMap<String, Tool>,
}

impl Toolchain {
    /// The tool producing the final output of `output_type`, if the
    /// toolchain defines one.
    #[must_use]
    pub fn tool_for_final_output(&self, output_type: OutputType) -> Option<&Tool> {
        final_output_tool_name(output_type).and_then(|name| self.tools.get(name))
    }
}

/// Name of the tool producing the final output of `output_type`.
#[must_use]
pub const fn final_output_tool_name(output_type: OutputType) -> Option<&'static str> {
    match output_type {
        OutputType::Executable => Some("link"),
        OutputType::SharedLibrary => Some("solink"),
        OutputType::LoadableModule => Some("solink_module"),
        OutputType::StaticLibrary => Some("alink"),
        _ => None,
    }
}

/// Expand an output directory pattern for `target`, relative to the build
/// directory.
///
/// `toolchain` is `None` for the default toolchain, whose outputs sit
/// directly in the build directory; other toolchains use a subdirectory
/// named after the toolchain.
///
/// # Errors
///
/// Returns [`PathError::UnknownSubstitution`] or
/// [`PathError::UnterminatedSubstitution`] for malformed patterns.
pub fn apply_output_dir_pattern(
    pattern: &str,
    target: &Target,
    toolchain: Option<&Label>,
) -> Result<String, PathError> {
    let root_out = toolchain.map_or_else(|| String::from("."), |tc| tc.name().to_owned());
    let target_dir = target.label.dir().components().join("/");

    let mut expanded = String::with_capacity(pattern.len());
    let mut rest = pattern;
    while let Some((before, after)) = rest.split_once("{{") {
        expanded.push_str(before);
        let (name, tail) = after
            .split_once("}}")
            .ok_or_else(|| PathError::UnterminatedSubstitution {
                pattern: pattern.to_owned(),
            })?;
        let value = match name {
            "root_out_dir" => root_out.clone(),
            "root_gen_dir" => join(&root_out, "gen"),
            "target_out_dir" => join(&root_out, &join("obj", &target_dir)),
            "target_gen_dir" => join(&root_out, &join("gen", &target_dir)),
            other => {
                return Err(PathError::UnknownSubstitution {
                    name: other.to_owned(),
                    pattern: pattern.to_owned(),
                });
            }
        };
        expanded.push_str(&value);
        rest = tail;
    }
    expanded.push_str(rest);
    Ok(normalise(&expanded))
}

fn join(base: &str, child: &str) -> String {
    match (base, child) {
        (".", _) | ("", _) => child.to_owned(),
        (_, "") => base.to_owned(),
        _ => format!("{base}/{child}"),
    }
}

fn normalise(path: &str) -> String {
    let joined = path
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .join("/");
    if joined.is_empty() {
        String::from(".")
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn target() -> Target {
        Target::new(Label::parse("//tools/gen:gen").expect("label"), OutputType::Executable)
    }

    #[rstest]
    #[case("{{root_out_dir}}", None, ".")]
    #[case("{{root_out_dir}}/bin", None, "bin")]
    #[case("{{target_out_dir}}", None, "obj/tools/gen")]
    #[case("{{target_gen_dir}}", None, "gen/tools/gen")]
    #[case("{{root_gen_dir}}", None, "gen")]
    #[case("{{root_out_dir}}", Some("//build/toolchain:host_x64"), "host_x64")]
    #[case("{{target_out_dir}}", Some("//build/toolchain:host_x64"), "host_x64/obj/tools/gen")]
    #[case("", None, ".")]
    fn expands_patterns(
        #[case] pattern: &str,
        #[case] toolchain: Option<&str>,
        #[case] expected: &str,
    ) {
        let qualifier = toolchain.map(|t| Label::parse(t).expect("label"));
        let expanded =
            apply_output_dir_pattern(pattern, &target(), qualifier.as_ref()).expect("pattern");
        assert_eq!(expanded, expected);
    }

    #[rstest]
    #[case("{{output_dir}}")]
    #[case("{{root_out_dir")]
    fn rejects_bad_patterns(#[case] pattern: &str) {
        assert!(apply_output_dir_pattern(pattern, &target(), None).is_err());
    }

    #[test]
    fn executables_use_the_link_tool() {
        let mut toolchain = Toolchain {
            label: Label::parse("//build/toolchain:clang").expect("label"),
            default: true,
            tools: BTreeMap::new(),
        };
        assert!(toolchain.tool_for_final_output(OutputType::Executable).is_none());
        toolchain.tools.insert(String::from("link"), Tool::default());
        assert!(toolchain.tool_for_final_output(OutputType::Executable).is_some());
        assert!(toolchain.tool_for_final_output(OutputType::Action).is_none());
    }
}
