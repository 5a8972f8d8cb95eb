//! Serialize a [`PbxProject`] in the `project.pbxproj` property list format.
//!
//! Objects are written in one section per class, classes in [`ObjectClass`]
//! order and objects within a class sorted by identifier. Build files and
//! file references are written on a single line; every other object writes
//! one property per line.

use super::{FileRole, NodeId, ObjectClass, ObjectKind, PbxError, PbxProject};

const HEADER: &str = "// !$*UTF8*$!\n{\n\tarchiveVersion = 1;\n\tclasses = {\n\t};\n\tobjectVersion = 46;\n\tobjects = {\n";

/// A property value.
enum Value {
    Str(String),
    Ref(String),
    List(Vec<Value>),
    Map(Vec<(String, Value)>),
}

impl Value {
    fn str(value: impl Into<String>) -> Self {
        Self::Str(value.into())
    }

    fn write(&self, out: &mut String, flat: bool, indent: usize) {
        match self {
            Self::Str(text) => out.push_str(&encode_string(text)),
            Self::Ref(text) => out.push_str(text),
            Self::List(items) => {
                out.push('(');
                for item in items {
                    if flat {
                        item.write(out, flat, indent);
                        out.push_str(", ");
                    } else {
                        out.push('\n');
                        push_tabs(out, indent + 1);
                        item.write(out, flat, indent + 1);
                        out.push(',');
                    }
                }
                if !flat && !items.is_empty() {
                    out.push('\n');
                    push_tabs(out, indent);
                }
                out.push(')');
            }
            Self::Map(entries) => {
                out.push('{');
                for (key, value) in entries {
                    if flat {
                        out.push_str(&encode_string(key));
                        out.push_str(" = ");
                        value.write(out, flat, indent);
                        out.push_str("; ");
                    } else {
                        out.push('\n');
                        push_tabs(out, indent + 1);
                        out.push_str(&encode_string(key));
                        out.push_str(" = ");
                        value.write(out, flat, indent + 1);
                        out.push(';');
                    }
                }
                if !flat && !entries.is_empty() {
                    out.push('\n');
                    push_tabs(out, indent);
                }
                out.push('}');
            }
        }
    }
}

fn push_tabs(out: &mut String, count: usize) {
    out.extend(std::iter::repeat_n('\t', count));
}

/// Quote `value` for the property list format when required.
///
/// Strings made only of ASCII alphanumerics and `$`, `.`, `/`, `_` are
/// written bare unless empty or containing `___`. Everything else is quoted
/// with `"` and `\` escaped and control characters written as escapes.
///
/// # Examples
///
/// ```
/// use pbxgen::pbx::encode_string;
///
/// assert_eq!(encode_string("sourcecode.cpp.objcpp"), "sourcecode.cpp.objcpp");
/// assert_eq!(encode_string("1,2"), "\"1,2\"");
/// assert_eq!(encode_string(""), "\"\"");
/// ```
#[must_use]
pub fn encode_string(value: &str) -> String {
    let bare = !value.is_empty()
        && !value.contains("___")
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '$' | '.' | '/' | '_'));
    if bare {
        return value.to_owned();
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\t' => quoted.push_str("\\t"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\u{7}' => quoted.push_str("\\a"),
            '\u{8}' => quoted.push_str("\\b"),
            '\u{b}' => quoted.push_str("\\v"),
            '\u{c}' => quoted.push_str("\\f"),
            control if control.is_ascii_control() => {
                quoted.push_str(&format!("\\U{:04x}", u32::from(control)));
            }
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}

impl PbxProject {
    /// Render the project file.
    ///
    /// # Errors
    ///
    /// Returns [`PbxError::UnassignedIdentifier`] when any reachable object
    /// has no identifier; call [`PbxProject::assign_ids`] first.
    pub fn render(&self) -> Result<String, PbxError> {
        let mut out = String::from(HEADER);
        for (class, nodes) in self.objects_by_class() {
            let mut sorted = nodes
                .into_iter()
                .map(|node| Ok((self.require_id(node)?, node)))
                .collect::<Result<Vec<(&str, NodeId)>, PbxError>>()?;
            sorted.sort_unstable();

            out.push_str(&format!("\n/* Begin {class} section */\n"));
            for (_, node) in sorted {
                self.write_object(&mut out, node)?;
            }
            out.push_str(&format!("/* End {class} section */\n"));
        }
        out.push_str(&format!(
            "\t}};\n\trootObject = {};\n}}\n",
            self.reference(self.root)?
        ));
        Ok(out)
    }

    fn require_id(&self, node: NodeId) -> Result<&str, PbxError> {
        self.object(node)
            .and_then(|object| object.id())
            .ok_or_else(|| PbxError::UnassignedIdentifier {
                class: self
                    .object(node)
                    .map_or(ObjectClass::Project, |object| object.class()),
                name: self.display_name(node),
            })
    }

    /// Identifier followed by the object's comment.
    fn reference(&self, node: NodeId) -> Result<String, PbxError> {
        let id = self.require_id(node)?;
        Ok(format!("{id} /* {} */", self.comment(node)))
    }

    fn comment(&self, node: NodeId) -> String {
        match self.kind(node) {
            Some(ObjectKind::Project) => String::from("Project object"),
            Some(ObjectKind::BuildFile(file)) => {
                format!("{} in Sources", self.display_name(file.file_ref))
            }
            _ => self.display_name(node),
        }
    }

    fn write_object(&self, out: &mut String, node: NodeId) -> Result<(), PbxError> {
        let Some(object) = self.object(node) else {
            return Ok(());
        };
        let class = object.class();
        let flat = matches!(class, ObjectClass::BuildFile | ObjectClass::FileReference);
        let mut properties = vec![(String::from("isa"), Value::str(class.isa()))];
        properties.extend(self.properties(node)?);

        out.push_str("\t\t");
        out.push_str(&self.reference(node)?);
        out.push_str(" = {");
        for (key, value) in &properties {
            if flat {
                out.push_str(&format!("{} = ", encode_string(key)));
                value.write(out, true, 0);
                out.push_str("; ");
            } else {
                out.push_str("\n\t\t\t");
                out.push_str(&format!("{} = ", encode_string(key)));
                value.write(out, false, 3);
                out.push(';');
            }
        }
        if flat {
            out.push_str("};\n");
        } else {
            out.push_str("\n\t\t};\n");
        }
        Ok(())
    }

    fn refs(&self, nodes: &[NodeId]) -> Result<Value, PbxError> {
        nodes
            .iter()
            .map(|&node| self.reference(node).map(Value::Ref))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List)
    }

    fn properties(&self, node: NodeId) -> Result<Vec<(String, Value)>, PbxError> {
        let Some(kind) = self.kind(node) else {
            return Ok(Vec::new());
        };
        let props: Vec<(&str, Value)> = match kind {
            ObjectKind::Project => vec![
                (
                    "attributes",
                    Value::Map(vec![(
                        String::from("BuildIndependentTargetsInParallel"),
                        Value::str("YES"),
                    )]),
                ),
                ("buildConfigurationList", Value::Ref(self.reference(self.configurations)?)),
                ("compatibilityVersion", Value::str("Xcode 3.2")),
                ("developmentRegion", Value::str("en")),
                ("hasScannedForEncodings", Value::str("1")),
                (
                    "knownRegions",
                    Value::List(vec![Value::str("en"), Value::str("Base")]),
                ),
                ("mainGroup", Value::Ref(self.reference(self.main_group)?)),
                ("productRefGroup", Value::Ref(self.reference(self.products_group)?)),
                ("projectDirPath", Value::str("")),
                ("projectRoot", Value::str("")),
                ("targets", self.refs(&self.targets)?),
            ],
            ObjectKind::Group(group) => {
                let mut entries = vec![("children", self.refs(&group.children)?)];
                if let Some(name) = group.name.as_ref().filter(|n| group.path.as_ref() != Some(*n)) {
                    entries.push(("name", Value::str(name.as_str())));
                }
                if let Some(path) = &group.path {
                    entries.push(("path", Value::str(path.as_str())));
                }
                entries.push(("sourceTree", Value::str("<group>")));
                entries
            }
            ObjectKind::FileReference(reference) => {
                let mut entries = Vec::with_capacity(5);
                match reference.role {
                    FileRole::Source => {
                        entries.push(("lastKnownFileType", Value::str(reference.file_type.as_str())));
                    }
                    FileRole::Product => {
                        entries.push(("explicitFileType", Value::str(reference.file_type.as_str())));
                        entries.push(("includeInIndex", Value::str("0")));
                    }
                }
                if reference.name != reference.path {
                    entries.push(("name", Value::str(reference.name.as_str())));
                }
                entries.push(("path", Value::str(reference.path.as_str())));
                let tree = match reference.role {
                    FileRole::Source => "<group>",
                    FileRole::Product => "BUILT_PRODUCTS_DIR",
                };
                entries.push(("sourceTree", Value::str(tree)));
                entries
            }
            ObjectKind::BuildFile(file) => {
                let mut entries = vec![("fileRef", Value::Ref(self.reference(file.file_ref)?))];
                if let Some(flag) = file.flags.as_flag() {
                    entries.push((
                        "settings",
                        Value::Map(vec![(String::from("COMPILER_FLAGS"), Value::str(flag))]),
                    ));
                }
                entries
            }
            ObjectKind::NativeTarget(native) => vec![
                (
                    "buildConfigurationList",
                    Value::Ref(self.reference(native.core.configurations)?),
                ),
                ("buildPhases", self.refs(&native.core.build_phases)?),
                ("buildRules", Value::List(Vec::new())),
                ("dependencies", self.refs(&native.core.dependencies)?),
                ("name", Value::str(native.core.name.as_str())),
                ("productName", Value::str(native.product_name.as_str())),
                (
                    "productReference",
                    Value::Ref(self.reference(native.product_reference)?),
                ),
                ("productType", Value::str(native.product_type.as_str())),
            ],
            ObjectKind::AggregateTarget(core) => vec![
                (
                    "buildConfigurationList",
                    Value::Ref(self.reference(core.configurations)?),
                ),
                ("buildPhases", self.refs(&core.build_phases)?),
                ("dependencies", self.refs(&core.dependencies)?),
                ("name", Value::str(core.name.as_str())),
                ("productName", Value::str(core.name.as_str())),
            ],
            ObjectKind::ShellScriptBuildPhase(script) => vec![
                ("buildActionMask", Value::str("2147483647")),
                ("files", Value::List(Vec::new())),
                ("inputPaths", Value::List(Vec::new())),
                ("name", Value::str(self.display_name(node))),
                ("outputPaths", Value::List(Vec::new())),
                ("runOnlyForDeploymentPostprocessing", Value::str("0")),
                ("shellPath", Value::str("/usr/bin/python3")),
                ("shellScript", Value::str(script.script.as_str())),
                ("showEnvVarsInLog", Value::str("0")),
            ],
            ObjectKind::SourcesBuildPhase(files) => vec![
                ("buildActionMask", Value::str("2147483647")),
                ("files", self.refs(files)?),
                ("runOnlyForDeploymentPostprocessing", Value::str("0")),
            ],
            ObjectKind::ContainerItemProxy(target) => vec![
                ("containerPortal", Value::Ref(self.reference(self.root)?)),
                ("proxyType", Value::str("1")),
                ("remoteGlobalIDString", Value::str(self.require_id(*target)?)),
                ("remoteInfo", Value::str(self.display_name(*target))),
            ],
            ObjectKind::TargetDependency(dependency) => vec![
                ("target", Value::Ref(self.reference(dependency.target)?)),
                ("targetProxy", Value::Ref(self.reference(dependency.proxy)?)),
            ],
            ObjectKind::BuildConfiguration(config) => vec![
                (
                    "buildSettings",
                    Value::Map(
                        config
                            .attributes
                            .iter()
                            .map(|(key, value)| (key.clone(), Value::str(value.as_str())))
                            .collect(),
                    ),
                ),
                ("name", Value::str(config.name.as_str())),
            ],
            ObjectKind::ConfigurationList(list) => vec![
                ("buildConfigurations", self.refs(&list.configurations)?),
                ("defaultConfigurationIsVisible", Value::str("1")),
                ("defaultConfigurationName", Value::str(list.default_name.as_str())),
            ],
        };
        Ok(props
            .into_iter()
            .map(|(key, value)| (key.to_owned(), value))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pbx::{Attributes, CompilerFlags, NativeTargetSpec};
    use rstest::rstest;

    #[rstest]
    #[case("YES", "YES")]
    #[case("../..", "../..")]
    #[case("$(SRCROOT)", "\"$(SRCROOT)\"")]
    #[case("a___b", "\"a___b\"")]
    #[case("say \"hi\"", "\"say \\\"hi\\\"\"")]
    #[case("line\nbreak", "\"line\\nbreak\"")]
    #[case("back\\slash", "\"back\\\\slash\"")]
    #[case("<group>", "\"<group>\"")]
    fn encodes_strings(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(encode_string(input), expected);
    }

    fn sample() -> PbxProject {
        let mut project = PbxProject::new("all", "Debug", "../..", Attributes::new());
        project
            .add_source_file_to_indexing_target("app/main.mm", "app/main.mm", CompilerFlags::None)
            .expect("add");
        project.add_aggregate_target("All", String::from("print('all')\n"));
        let target = project.add_native_target(NativeTargetSpec {
            name: String::from("App"),
            output_name: String::from("App.app"),
            product_type: String::from("com.apple.product-type.application"),
            output_dir: String::from("."),
            shell_script: String::from("print('app')\n"),
            ..NativeTargetSpec::default()
        });
        project
            .add_source_file("app/a_xctest.mm", "app/a_xctest.mm", CompilerFlags::Help, target)
            .expect("add");
        project
    }

    #[test]
    fn rendering_requires_identifiers() {
        let err = sample().render().expect_err("no ids");
        assert!(matches!(err, PbxError::UnassignedIdentifier { .. }));
    }

    #[test]
    fn renders_sections_in_class_order() {
        let mut project = sample();
        project.assign_ids().expect("ids");
        let text = project.render().expect("render");
        assert!(text.starts_with("// !$*UTF8*$!\n{\n\tarchiveVersion = 1;"));
        assert!(text.ends_with("/* Project object */;\n}\n"));

        let positions: Vec<usize> = [
            "PBXAggregateTarget",
            "PBXBuildFile",
            "PBXFileReference",
            "PBXGroup",
            "PBXNativeTarget",
            "PBXProject",
            "PBXShellScriptBuildPhase",
            "PBXSourcesBuildPhase",
            "XCBuildConfiguration",
            "XCConfigurationList",
        ]
        .iter()
        .map(|class| {
            text.find(&format!("/* Begin {class} section */"))
                .expect("section present")
        })
        .collect();
        assert!(positions.windows(2).all(|pair| pair.first() < pair.last()));
        assert!(!text.contains("PBXTargetDependency section"));
    }

    #[test]
    fn build_files_render_on_one_line() {
        let mut project = sample();
        project.assign_ids().expect("ids");
        let text = project.render().expect("render");
        let line = text
            .lines()
            .find(|line| line.contains("a_xctest.mm in Sources */ = {"))
            .expect("build file line");
        assert!(line.contains("isa = PBXBuildFile; fileRef = "));
        assert!(line.ends_with("settings = {COMPILER_FLAGS = \"--help\"; }; };"));
    }

    #[test]
    fn scripts_run_under_python() {
        let mut project = sample();
        project.assign_ids().expect("ids");
        let text = project.render().expect("render");
        assert!(text.contains("name = \"Action \\\"Compile and copy App via ninja\\\"\";"));
        assert!(text.contains("shellPath = /usr/bin/python3;"));
        assert!(text.contains("shellScript = \"print('app')\\n\";"));
    }
}
