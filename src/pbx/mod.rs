//! The Xcode project object graph.
//!
//! Objects live in an arena owned by [`PbxProject`] and are addressed by
//! [`NodeId`]. Every object except the project itself has exactly one owner,
//! so the graph forms a tree rooted at the project:
//!
//! - the main group owns the `Source` and `Products` groups, which own the
//!   navigator folders and file references;
//! - targets own their configuration list, build phases and dependencies;
//! - a sources build phase owns its build files;
//! - a target dependency owns its container item proxy.
//!
//! [`PbxProject::traversal_order`] walks that tree depth first. Identifiers
//! are assigned in that order by [`PbxProject::assign_ids`] and the project
//! is serialized by [`PbxProject::render`].

pub mod file_type;
mod ids;
mod render;

pub use ids::object_id;
pub use render::encode_string;

use miette::Diagnostic;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Build settings of a configuration, keyed by setting name.
pub type Attributes = BTreeMap<String, String>;

/// Product type of command line tools.
pub const TOOL_PRODUCT_TYPE: &str = "com.apple.product-type.tool";

/// File type of Mach-O executables.
pub const EXECUTABLE_FILE_TYPE: &str = "compiled.mach-o.executable";

/// Name of the target that compiles every project source for indexing.
pub const INDEXING_TARGET_NAME: &str = "sources";

/// Index of an object in a [`PbxProject`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the object in the arena.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Object class tags, declared in serialization order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectClass {
    /// `PBXAggregateTarget`.
    AggregateTarget,
    /// `PBXBuildFile`.
    BuildFile,
    /// `PBXContainerItemProxy`.
    ContainerItemProxy,
    /// `PBXFileReference`.
    FileReference,
    /// `PBXGroup`.
    Group,
    /// `PBXNativeTarget`.
    NativeTarget,
    /// `PBXProject`.
    Project,
    /// `PBXShellScriptBuildPhase`.
    ShellScriptBuildPhase,
    /// `PBXSourcesBuildPhase`.
    SourcesBuildPhase,
    /// `PBXTargetDependency`.
    TargetDependency,
    /// `XCBuildConfiguration`.
    BuildConfiguration,
    /// `XCConfigurationList`.
    ConfigurationList,
}

impl ObjectClass {
    /// The `isa` name written to the project file.
    #[must_use]
    pub const fn isa(self) -> &'static str {
        match self {
            Self::AggregateTarget => "PBXAggregateTarget",
            Self::BuildFile => "PBXBuildFile",
            Self::ContainerItemProxy => "PBXContainerItemProxy",
            Self::FileReference => "PBXFileReference",
            Self::Group => "PBXGroup",
            Self::NativeTarget => "PBXNativeTarget",
            Self::Project => "PBXProject",
            Self::ShellScriptBuildPhase => "PBXShellScriptBuildPhase",
            Self::SourcesBuildPhase => "PBXSourcesBuildPhase",
            Self::TargetDependency => "PBXTargetDependency",
            Self::BuildConfiguration => "XCBuildConfiguration",
            Self::ConfigurationList => "XCConfigurationList",
        }
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.isa())
    }
}

/// Compiler flag mode of a build file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompilerFlags {
    /// Compile normally.
    #[default]
    None,
    /// Pass `--help` so the file is listed but never compiled.
    Help,
}

impl CompilerFlags {
    /// The `COMPILER_FLAGS` value, if any.
    #[must_use]
    pub const fn as_flag(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Help => Some("--help"),
        }
    }
}

/// Errors raised by object graph operations.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum PbxError {
    /// An object reached serialization without an identifier.
    #[error("{class} `{name}` has no identifier")]
    #[diagnostic(
        code(pbxgen::pbx::unassigned_identifier),
        help("identifiers must be assigned before the project is rendered")
    )]
    UnassignedIdentifier {
        /// Class of the object.
        class: ObjectClass,
        /// Display name of the object.
        name: String,
    },
    /// An object was assigned an identifier twice.
    #[error("{class} `{name}` already has identifier {id}")]
    #[diagnostic(code(pbxgen::pbx::identifier_reassigned))]
    IdentifierReassigned {
        /// Class of the object.
        class: ObjectClass,
        /// Display name of the object.
        name: String,
        /// Identifier already held.
        id: String,
    },
    /// A node of the wrong class was passed to an operation.
    #[error("object #{node} is not a {expected}")]
    #[diagnostic(code(pbxgen::pbx::unexpected_object))]
    UnexpectedObject {
        /// Arena index of the node.
        node: usize,
        /// Expected kind.
        expected: &'static str,
    },
    /// A file was added with an empty navigator path.
    #[error("cannot add a file with an empty path")]
    #[diagnostic(code(pbxgen::pbx::empty_path))]
    EmptyPath,
}

/// Everything needed to create a native target for a build product.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NativeTargetSpec {
    /// Display name.
    pub name: String,
    /// Explicit product file type; inferred from `output_name` when `None`.
    pub file_type: Option<String>,
    /// Product file name relative to `output_dir`.
    pub output_name: String,
    /// Apple product type.
    pub product_type: String,
    /// Directory holding the product, relative to the build directory.
    pub output_dir: String,
    /// Build delegation script.
    pub shell_script: String,
    /// Additional build settings.
    pub extra_attributes: Attributes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileRole {
    Source,
    Product,
}

#[derive(Debug, Clone)]
struct Group {
    name: Option<String>,
    path: Option<String>,
    children: Vec<NodeId>,
    autosorted: bool,
}

#[derive(Debug, Clone)]
struct FileReference {
    name: String,
    path: String,
    source_path: String,
    file_type: String,
    role: FileRole,
}

#[derive(Debug, Clone)]
struct BuildFile {
    file_ref: NodeId,
    flags: CompilerFlags,
}

#[derive(Debug, Clone)]
struct TargetCore {
    name: String,
    configurations: NodeId,
    build_phases: Vec<NodeId>,
    dependencies: Vec<NodeId>,
}

#[derive(Debug, Clone)]
struct NativeTarget {
    core: TargetCore,
    product_type: String,
    product_name: String,
    product_reference: NodeId,
    sources_phase: NodeId,
}

#[derive(Debug, Clone)]
struct ShellScript {
    target_name: String,
    script: String,
}

#[derive(Debug, Clone)]
struct Dependency {
    target: NodeId,
    proxy: NodeId,
}

#[derive(Debug, Clone)]
struct BuildConfiguration {
    name: String,
    attributes: Attributes,
}

#[derive(Debug, Clone)]
struct ConfigurationList {
    owner_class: ObjectClass,
    owner_name: String,
    configurations: Vec<NodeId>,
    default_name: String,
}

#[derive(Debug, Clone)]
enum ObjectKind {
    Project,
    Group(Group),
    FileReference(FileReference),
    BuildFile(BuildFile),
    NativeTarget(NativeTarget),
    AggregateTarget(TargetCore),
    ShellScriptBuildPhase(ShellScript),
    SourcesBuildPhase(Vec<NodeId>),
    ContainerItemProxy(NodeId),
    TargetDependency(Dependency),
    BuildConfiguration(BuildConfiguration),
    ConfigurationList(ConfigurationList),
}

impl ObjectKind {
    const fn class(&self) -> ObjectClass {
        match self {
            Self::Project => ObjectClass::Project,
            Self::Group(_) => ObjectClass::Group,
            Self::FileReference(_) => ObjectClass::FileReference,
            Self::BuildFile(_) => ObjectClass::BuildFile,
            Self::NativeTarget(_) => ObjectClass::NativeTarget,
            Self::AggregateTarget(_) => ObjectClass::AggregateTarget,
            Self::ShellScriptBuildPhase(_) => ObjectClass::ShellScriptBuildPhase,
            Self::SourcesBuildPhase(_) => ObjectClass::SourcesBuildPhase,
            Self::ContainerItemProxy(_) => ObjectClass::ContainerItemProxy,
            Self::TargetDependency(_) => ObjectClass::TargetDependency,
            Self::BuildConfiguration(_) => ObjectClass::BuildConfiguration,
            Self::ConfigurationList(_) => ObjectClass::ConfigurationList,
        }
    }
}

/// An object in the project arena.
#[derive(Debug, Clone)]
pub struct PbxObject {
    kind: ObjectKind,
    owner: Option<NodeId>,
    id: Option<String>,
}

impl PbxObject {
    /// Class tag of the object.
    #[must_use]
    pub const fn class(&self) -> ObjectClass {
        self.kind.class()
    }

    /// Identifier, once assigned.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Owning object; `None` only for the project.
    #[must_use]
    pub const fn owner(&self) -> Option<NodeId> {
        self.owner
    }
}

/// An Xcode project under construction.
#[derive(Debug, Clone)]
pub struct PbxProject {
    objects: Vec<PbxObject>,
    root: NodeId,
    name: String,
    config_name: String,
    source_path: String,
    main_group: NodeId,
    sources_group: NodeId,
    products_group: NodeId,
    targets: Vec<NodeId>,
    configurations: NodeId,
    indexing_target: Option<NodeId>,
}

impl PbxProject {
    /// Create an empty project.
    ///
    /// `source_path` is the source root relative to the project directory
    /// and `attributes` are the project-level build settings of the single
    /// configuration `config_name`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        config_name: impl Into<String>,
        source_path: impl Into<String>,
        attributes: Attributes,
    ) -> Self {
        let root = NodeId(0);
        let mut project = Self {
            objects: vec![PbxObject {
                kind: ObjectKind::Project,
                owner: None,
                id: None,
            }],
            root,
            name: name.into(),
            config_name: config_name.into(),
            source_path: source_path.into(),
            main_group: root,
            sources_group: root,
            products_group: root,
            targets: Vec::new(),
            configurations: root,
            indexing_target: None,
        };

        project.main_group = project.push(ObjectKind::Group(Group::new(None, None, false)), Some(root));
        let source_path = project.source_path.clone();
        project.sources_group = project.push_group_child(
            project.main_group,
            Group::new(Some(String::from("Source")), Some(source_path), true),
        );
        project.products_group = project.push_group_child(
            project.main_group,
            Group::new(Some(String::from("Products")), None, true),
        );
        let name = project.name.clone();
        project.configurations =
            project.create_configuration_list(ObjectClass::Project, &name, attributes);
        project.adopt(root, project.configurations);
        project
    }

    /// Project name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the single build configuration.
    #[must_use]
    pub fn config_name(&self) -> &str {
        &self.config_name
    }

    /// Source root relative to the project directory.
    #[must_use]
    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    /// The project object.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Number of objects in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the graph holds no objects; never true once constructed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Look up an object.
    #[must_use]
    pub fn object(&self, node: NodeId) -> Option<&PbxObject> {
        self.objects.get(node.0)
    }

    /// Targets in creation order.
    #[must_use]
    pub fn targets(&self) -> &[NodeId] {
        &self.targets
    }

    /// The first target named `name`.
    #[must_use]
    pub fn find_target(&self, name: &str) -> Option<NodeId> {
        self.targets
            .iter()
            .copied()
            .find(|&target| self.target_core(target).is_ok_and(|core| core.name == name))
    }

    /// Add a file to the project-wide indexing target, creating that target
    /// on first use.
    ///
    /// # Errors
    ///
    /// Returns [`PbxError::EmptyPath`] for an empty `navigator_path`.
    pub fn add_source_file_to_indexing_target(
        &mut self,
        navigator_path: &str,
        source_path: &str,
        flags: CompilerFlags,
    ) -> Result<NodeId, PbxError> {
        let target = match self.indexing_target {
            Some(target) => target,
            None => {
                let target = self.add_indexing_target();
                self.indexing_target = Some(target);
                target
            }
        };
        self.add_source_file(navigator_path, source_path, flags, target)
    }

    /// Add a file to the navigator tree and, when its extension is
    /// indexable, to `target`'s compile sources.
    ///
    /// A file reference with the same name and path is reused. Returns the
    /// file reference.
    ///
    /// # Errors
    ///
    /// Returns [`PbxError::UnexpectedObject`] when `target` is not a native
    /// target and [`PbxError::EmptyPath`] for an empty `navigator_path`.
    pub fn add_source_file(
        &mut self,
        navigator_path: &str,
        source_path: &str,
        flags: CompilerFlags,
        target: NodeId,
    ) -> Result<NodeId, PbxError> {
        let sources_phase = self.native_target(target)?.sources_phase;
        let file_ref = self.add_file_to_group(self.sources_group, navigator_path, source_path)?;
        let indexable = file_type::extension(navigator_path)
            .is_some_and(file_type::is_source_file_for_indexing);
        if indexable {
            let build_file = self.push(
                ObjectKind::BuildFile(BuildFile { file_ref, flags }),
                Some(sources_phase),
            );
            match self.kind_mut(sources_phase) {
                Some(ObjectKind::SourcesBuildPhase(files)) => files.push(build_file),
                _ => return Err(unexpected(sources_phase, "sources build phase")),
            }
        }
        Ok(file_ref)
    }

    /// Create the aggregate target `name` that runs `shell_script`.
    pub fn add_aggregate_target(&mut self, name: &str, shell_script: String) -> NodeId {
        let mut attributes = Attributes::new();
        attributes.insert(String::from("CODE_SIGNING_REQUIRED"), String::from("NO"));
        attributes.insert(String::from("PRODUCT_NAME"), name.to_owned());
        let configurations =
            self.create_configuration_list(ObjectClass::AggregateTarget, name, attributes);
        let script = self.push(
            ObjectKind::ShellScriptBuildPhase(ShellScript {
                target_name: name.to_owned(),
                script: shell_script,
            }),
            None,
        );
        let core = TargetCore {
            name: name.to_owned(),
            configurations,
            build_phases: vec![script],
            dependencies: Vec::new(),
        };
        let target = self.push(ObjectKind::AggregateTarget(core), Some(self.root));
        self.adopt(target, configurations);
        self.adopt(target, script);
        self.targets.push(target);
        target
    }

    /// Create a native target producing `spec.output_name`.
    ///
    /// The target's build settings are `spec.extra_attributes` plus
    /// `CODE_SIGNING_REQUIRED`, `CONFIGURATION_BUILD_DIR` and `PRODUCT_NAME`.
    pub fn add_native_target(&mut self, spec: NativeTargetSpec) -> NodeId {
        let NativeTargetSpec {
            name,
            file_type,
            output_name,
            product_type,
            output_dir,
            shell_script,
            extra_attributes,
        } = spec;
        let product_reference = self.create_product_reference(&output_name, file_type);
        let product_name = product_name(&output_name);

        let mut attributes = extra_attributes;
        attributes.insert(String::from("CODE_SIGNING_REQUIRED"), String::from("NO"));
        attributes.insert(String::from("CONFIGURATION_BUILD_DIR"), output_dir);
        attributes.insert(String::from("PRODUCT_NAME"), product_name.clone());

        self.create_native_target(NativeTargetParts {
            name,
            shell_script: Some(shell_script),
            attributes,
            product_type,
            product_name,
            product_reference,
        })
    }

    /// Record that `dependent` depends on `base`.
    ///
    /// Creates a target dependency owned by `dependent`, which owns a
    /// container item proxy pointing at `base`. Returns the dependency.
    ///
    /// # Errors
    ///
    /// Returns [`PbxError::UnexpectedObject`] when either node is not a
    /// target.
    pub fn add_dependency(&mut self, base: NodeId, dependent: NodeId) -> Result<NodeId, PbxError> {
        self.target_core(base)?;
        self.target_core(dependent)?;
        let proxy = self.push(ObjectKind::ContainerItemProxy(base), None);
        let dependency = self.push(
            ObjectKind::TargetDependency(Dependency {
                target: base,
                proxy,
            }),
            Some(dependent),
        );
        self.adopt(dependency, proxy);
        self.target_core_mut(dependent)?.dependencies.push(dependency);
        Ok(dependency)
    }

    /// Targets `target` depends on, in insertion order.
    #[must_use]
    pub fn target_dependencies(&self, target: NodeId) -> Vec<NodeId> {
        self.target_core(target)
            .map(|core| {
                core.dependencies
                    .iter()
                    .filter_map(|&dep| match self.kind(dep) {
                        Some(ObjectKind::TargetDependency(dependency)) => Some(dependency.target),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Compile sources of a native target as `(path, flags)` pairs.
    #[must_use]
    pub fn compile_sources(&self, target: NodeId) -> Vec<(String, CompilerFlags)> {
        let Ok(native) = self.native_target(target) else {
            return Vec::new();
        };
        let Some(ObjectKind::SourcesBuildPhase(files)) = self.kind(native.sources_phase) else {
            return Vec::new();
        };
        files
            .iter()
            .filter_map(|&build_file| match self.kind(build_file) {
                Some(ObjectKind::BuildFile(file)) => match self.kind(file.file_ref) {
                    Some(ObjectKind::FileReference(reference)) => {
                        Some((reference.source_path.clone(), file.flags))
                    }
                    _ => None,
                },
                _ => None,
            })
            .collect()
    }

    /// The delegation script of a target, if it has one.
    #[must_use]
    pub fn target_script(&self, target: NodeId) -> Option<&str> {
        let core = self.target_core(target).ok()?;
        core.build_phases.iter().find_map(|&phase| match self.kind(phase) {
            Some(ObjectKind::ShellScriptBuildPhase(script)) => Some(script.script.as_str()),
            _ => None,
        })
    }

    /// Product type of a native target.
    #[must_use]
    pub fn product_type(&self, target: NodeId) -> Option<&str> {
        self.native_target(target)
            .ok()
            .map(|native| native.product_type.as_str())
    }

    /// Build settings of a target's configuration, or of the project when
    /// given the root.
    #[must_use]
    pub fn build_settings(&self, node: NodeId) -> Option<&Attributes> {
        let list = if node == self.root {
            self.configurations
        } else {
            self.target_core(node).ok()?.configurations
        };
        let Some(ObjectKind::ConfigurationList(list)) = self.kind(list) else {
            return None;
        };
        list.configurations
            .iter()
            .find_map(|&config| match self.kind(config) {
                Some(ObjectKind::BuildConfiguration(config)) => Some(&config.attributes),
                _ => None,
            })
    }

    /// Objects directly owned by `node`, in traversal order.
    #[must_use]
    pub fn owned(&self, node: NodeId) -> Vec<NodeId> {
        let Some(kind) = self.kind(node) else {
            return Vec::new();
        };
        match kind {
            ObjectKind::Project => std::iter::once(self.main_group)
                .chain(self.targets.iter().copied())
                .chain(std::iter::once(self.configurations))
                .collect(),
            ObjectKind::Group(group) => group.children.clone(),
            ObjectKind::NativeTarget(native) => core_owned(&native.core),
            ObjectKind::AggregateTarget(core) => core_owned(core),
            ObjectKind::SourcesBuildPhase(files) => files.clone(),
            ObjectKind::TargetDependency(dependency) => vec![dependency.proxy],
            ObjectKind::ConfigurationList(list) => list.configurations.clone(),
            ObjectKind::FileReference(_)
            | ObjectKind::BuildFile(_)
            | ObjectKind::ShellScriptBuildPhase(_)
            | ObjectKind::ContainerItemProxy(_)
            | ObjectKind::BuildConfiguration(_) => Vec::new(),
        }
    }

    /// Every object reachable from the project, depth first, each once.
    #[must_use]
    pub fn traversal_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.objects.len());
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            order.push(node);
            stack.extend(self.owned(node).into_iter().rev());
        }
        order
    }

    /// Reachable objects grouped by class.
    #[must_use]
    pub fn objects_by_class(&self) -> BTreeMap<ObjectClass, Vec<NodeId>> {
        let mut classes: BTreeMap<ObjectClass, Vec<NodeId>> = BTreeMap::new();
        for node in self.traversal_order() {
            if let Some(object) = self.object(node) {
                classes.entry(object.class()).or_default().push(node);
            }
        }
        classes
    }

    /// Name of an object as used for identifier derivation.
    #[must_use]
    pub fn display_name(&self, node: NodeId) -> String {
        let Some(kind) = self.kind(node) else {
            return String::new();
        };
        match kind {
            ObjectKind::Project => self.name.clone(),
            ObjectKind::Group(group) => group
                .name
                .clone()
                .or_else(|| group.path.clone())
                .unwrap_or_default(),
            ObjectKind::FileReference(reference) => reference.name.clone(),
            ObjectKind::BuildFile(file) => self.display_name(file.file_ref),
            ObjectKind::NativeTarget(native) => native.core.name.clone(),
            ObjectKind::AggregateTarget(core) => core.name.clone(),
            ObjectKind::ShellScriptBuildPhase(script) => {
                format!("Action \"Compile and copy {} via ninja\"", script.target_name)
            }
            ObjectKind::SourcesBuildPhase(_) => String::from("Sources"),
            ObjectKind::ContainerItemProxy(_) => String::from("PBXContainerItemProxy"),
            ObjectKind::TargetDependency(_) => String::from("PBXTargetDependency"),
            ObjectKind::BuildConfiguration(config) => config.name.clone(),
            ObjectKind::ConfigurationList(list) => format!(
                "Build configuration list for {} \"{}\"",
                list.owner_class, list.owner_name
            ),
        }
    }

    fn kind(&self, node: NodeId) -> Option<&ObjectKind> {
        self.objects.get(node.0).map(|object| &object.kind)
    }

    fn kind_mut(&mut self, node: NodeId) -> Option<&mut ObjectKind> {
        self.objects.get_mut(node.0).map(|object| &mut object.kind)
    }

    fn push(&mut self, kind: ObjectKind, owner: Option<NodeId>) -> NodeId {
        let node = NodeId(self.objects.len());
        self.objects.push(PbxObject {
            kind,
            owner,
            id: None,
        });
        node
    }

    fn adopt(&mut self, parent: NodeId, child: NodeId) {
        if let Some(object) = self.objects.get_mut(child.0) {
            object.owner = Some(parent);
        }
    }

    fn target_core(&self, node: NodeId) -> Result<&TargetCore, PbxError> {
        match self.kind(node) {
            Some(ObjectKind::NativeTarget(native)) => Ok(&native.core),
            Some(ObjectKind::AggregateTarget(core)) => Ok(core),
            _ => Err(unexpected(node, "target")),
        }
    }

    fn target_core_mut(&mut self, node: NodeId) -> Result<&mut TargetCore, PbxError> {
        match self.kind_mut(node) {
            Some(ObjectKind::NativeTarget(native)) => Ok(&mut native.core),
            Some(ObjectKind::AggregateTarget(core)) => Ok(core),
            _ => Err(unexpected(node, "target")),
        }
    }

    fn native_target(&self, node: NodeId) -> Result<&NativeTarget, PbxError> {
        match self.kind(node) {
            Some(ObjectKind::NativeTarget(native)) => Ok(native),
            _ => Err(unexpected(node, "native target")),
        }
    }

    fn create_configuration_list(
        &mut self,
        owner_class: ObjectClass,
        owner_name: &str,
        attributes: Attributes,
    ) -> NodeId {
        let config = self.push(
            ObjectKind::BuildConfiguration(BuildConfiguration {
                name: self.config_name.clone(),
                attributes,
            }),
            None,
        );
        let list = self.push(
            ObjectKind::ConfigurationList(ConfigurationList {
                owner_class,
                owner_name: owner_name.to_owned(),
                configurations: vec![config],
                default_name: self.config_name.clone(),
            }),
            None,
        );
        self.adopt(list, config);
        list
    }

    fn add_indexing_target(&mut self) -> NodeId {
        let mut attributes = Attributes::new();
        attributes.insert(String::from("EXECUTABLE_PREFIX"), String::new());
        attributes.insert(String::from("HEADER_SEARCH_PATHS"), self.source_path.clone());
        attributes.insert(String::from("PRODUCT_NAME"), String::from(INDEXING_TARGET_NAME));
        let product_reference = self.create_product_reference(
            INDEXING_TARGET_NAME,
            Some(String::from(EXECUTABLE_FILE_TYPE)),
        );
        self.create_native_target(NativeTargetParts {
            name: String::from(INDEXING_TARGET_NAME),
            shell_script: None,
            attributes,
            product_type: String::from(TOOL_PRODUCT_TYPE),
            product_name: String::from(INDEXING_TARGET_NAME),
            product_reference,
        })
    }

    fn create_native_target(&mut self, parts: NativeTargetParts) -> NodeId {
        let configurations =
            self.create_configuration_list(ObjectClass::NativeTarget, &parts.name, parts.attributes);
        let mut build_phases = Vec::with_capacity(2);
        if let Some(script) = parts.shell_script {
            build_phases.push(self.push(
                ObjectKind::ShellScriptBuildPhase(ShellScript {
                    target_name: parts.name.clone(),
                    script,
                }),
                None,
            ));
        }
        let sources_phase = self.push(ObjectKind::SourcesBuildPhase(Vec::new()), None);
        build_phases.push(sources_phase);

        let children: Vec<NodeId> = std::iter::once(configurations)
            .chain(build_phases.iter().copied())
            .collect();
        let target = self.push(
            ObjectKind::NativeTarget(NativeTarget {
                core: TargetCore {
                    name: parts.name,
                    configurations,
                    build_phases,
                    dependencies: Vec::new(),
                },
                product_type: parts.product_type,
                product_name: parts.product_name,
                product_reference: parts.product_reference,
                sources_phase,
            }),
            Some(self.root),
        );
        for child in children {
            self.adopt(target, child);
        }
        self.targets.push(target);
        target
    }

    fn create_product_reference(
        &mut self,
        output_name: &str,
        explicit_type: Option<String>,
    ) -> NodeId {
        let file_type = explicit_type
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| file_type::file_type_for_path(output_name).to_owned());
        let reference = FileReference {
            name: output_name.to_owned(),
            path: output_name.to_owned(),
            source_path: output_name.to_owned(),
            file_type,
            role: FileRole::Product,
        };
        self.push_group_child(self.products_group, reference)
    }

    fn add_file_to_group(
        &mut self,
        group: NodeId,
        navigator_path: &str,
        source_path: &str,
    ) -> Result<NodeId, PbxError> {
        let mut components: Vec<&str> =
            navigator_path.split('/').filter(|c| !c.is_empty()).collect();
        let file_name = components.pop().ok_or(PbxError::EmptyPath)?;

        let mut parent = group;
        for component in components {
            parent = match self.find_child_group(parent, component) {
                Some(existing) => existing,
                None => self.push_group_child(
                    parent,
                    Group::new(Some(component.to_owned()), Some(component.to_owned()), true),
                ),
            };
        }

        if let Some(existing) = self.find_child_file(parent, file_name, source_path) {
            return Ok(existing);
        }
        let on_disk = source_path.rsplit('/').next().unwrap_or(source_path);
        let reference = FileReference {
            name: file_name.to_owned(),
            path: on_disk.to_owned(),
            source_path: source_path.to_owned(),
            file_type: file_type::file_type_for_path(source_path).to_owned(),
            role: FileRole::Source,
        };
        Ok(self.push_group_child(parent, reference))
    }

    fn find_child_group(&self, group: NodeId, component: &str) -> Option<NodeId> {
        let Some(ObjectKind::Group(parent)) = self.kind(group) else {
            return None;
        };
        parent.children.iter().copied().find(|&child| {
            matches!(self.kind(child), Some(ObjectKind::Group(g))
                if g.name.as_deref().or(g.path.as_deref()) == Some(component))
        })
    }

    fn find_child_file(&self, group: NodeId, name: &str, source_path: &str) -> Option<NodeId> {
        let Some(ObjectKind::Group(parent)) = self.kind(group) else {
            return None;
        };
        parent.children.iter().copied().find(|&child| {
            matches!(self.kind(child), Some(ObjectKind::FileReference(f))
                if f.name == name && f.source_path == source_path)
        })
    }

    fn push_group_child(&mut self, group: NodeId, child: impl Into<ObjectKind>) -> NodeId {
        let node = self.push(child.into(), Some(group));
        let key = self.sort_key(node);
        let sibling_keys: Vec<(bool, String)> = match self.kind(group) {
            Some(ObjectKind::Group(parent)) => parent
                .children
                .iter()
                .map(|&sibling| self.sort_key(sibling))
                .collect(),
            _ => Vec::new(),
        };
        if let Some(ObjectKind::Group(parent)) = self.kind_mut(group) {
            if parent.autosorted {
                let position = sibling_keys.partition_point(|sibling| *sibling <= key);
                parent.children.insert(position, node);
            } else {
                parent.children.push(node);
            }
        }
        node
    }

    /// Groups sort before files, then by name.
    fn sort_key(&self, node: NodeId) -> (bool, String) {
        let is_file = !matches!(self.kind(node), Some(ObjectKind::Group(_)));
        (is_file, self.display_name(node))
    }
}

struct NativeTargetParts {
    name: String,
    shell_script: Option<String>,
    attributes: Attributes,
    product_type: String,
    product_name: String,
    product_reference: NodeId,
}

impl Group {
    const fn new(name: Option<String>, path: Option<String>, autosorted: bool) -> Self {
        Self {
            name,
            path,
            children: Vec::new(),
            autosorted,
        }
    }
}

impl From<Group> for ObjectKind {
    fn from(group: Group) -> Self {
        Self::Group(group)
    }
}

impl From<FileReference> for ObjectKind {
    fn from(reference: FileReference) -> Self {
        Self::FileReference(reference)
    }
}

fn core_owned(core: &TargetCore) -> Vec<NodeId> {
    std::iter::once(core.configurations)
        .chain(core.build_phases.iter().copied())
        .chain(core.dependencies.iter().copied())
        .collect()
}

fn unexpected(node: NodeId, expected: &'static str) -> PbxError {
    PbxError::UnexpectedObject {
        node: node.0,
        expected,
    }
}

/// File name of `output_name` without directory or extension.
fn product_name(output_name: &str) -> String {
    let base = output_name.rsplit('/').next().unwrap_or(output_name);
    base.rsplit_once('.')
        .map_or(base, |(stem, _)| stem)
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn project() -> PbxProject {
        PbxProject::new("all", "Debug", "../..", Attributes::new())
    }

    fn spec(name: &str, output_name: &str) -> NativeTargetSpec {
        NativeTargetSpec {
            name: name.to_owned(),
            output_name: output_name.to_owned(),
            product_type: String::from("com.apple.product-type.application"),
            output_dir: String::from("."),
            shell_script: String::from("exit 0"),
            ..NativeTargetSpec::default()
        }
    }

    #[test]
    fn indexing_target_is_created_lazily() {
        let mut project = project();
        assert!(project.targets().is_empty());
        project
            .add_source_file_to_indexing_target("base/a.cc", "base/a.cc", CompilerFlags::None)
            .expect("add");
        project
            .add_source_file_to_indexing_target("base/a.h", "base/a.h", CompilerFlags::None)
            .expect("add");
        let sources = project.find_target(INDEXING_TARGET_NAME).expect("indexing target");
        assert_eq!(project.targets(), [sources]);
        assert_eq!(
            project.compile_sources(sources),
            [(String::from("base/a.cc"), CompilerFlags::None)]
        );
    }

    #[test]
    fn file_references_are_reused() {
        let mut project = project();
        let target = project.add_native_target(spec("App", "App.app"));
        let first = project
            .add_source_file("app/main.mm", "app/main.mm", CompilerFlags::None, target)
            .expect("add");
        let second = project
            .add_source_file("app/main.mm", "app/main.mm", CompilerFlags::Help, target)
            .expect("add");
        assert_eq!(first, second);
        assert_eq!(project.compile_sources(target).len(), 2);
    }

    #[test]
    fn groups_sort_before_files() {
        let mut project = project();
        for path in ["z.cc", "b/x.cc", "a.cc", "a/y.cc"] {
            project
                .add_source_file_to_indexing_target(path, path, CompilerFlags::None)
                .expect("add");
        }
        let names: Vec<String> = project
            .owned(project.sources_group)
            .into_iter()
            .map(|node| project.display_name(node))
            .collect();
        assert_eq!(names, ["a", "b", "a.cc", "z.cc"]);
    }

    #[test]
    fn native_target_attributes_include_product_settings() {
        let mut project = project();
        let mut spec = spec("App", "App.app");
        spec.extra_attributes
            .insert(String::from("CODE_SIGN_IDENTITY"), String::new());
        let target = project.add_native_target(spec);
        let settings = project.build_settings(target).expect("settings");
        assert_eq!(settings.get("PRODUCT_NAME").map(String::as_str), Some("App"));
        assert_eq!(settings.get("CONFIGURATION_BUILD_DIR").map(String::as_str), Some("."));
        assert_eq!(settings.get("CODE_SIGNING_REQUIRED").map(String::as_str), Some("NO"));
        assert_eq!(settings.get("CODE_SIGN_IDENTITY").map(String::as_str), Some(""));
        assert_eq!(
            project.product_type(target),
            Some("com.apple.product-type.application")
        );
    }

    #[test]
    fn dependencies_are_owned_by_the_dependent() {
        let mut project = project();
        let host = project.add_native_target(spec("Host", "Host.app"));
        let module = project.add_native_target(spec("Tests", "Tests.xctest"));
        let dependency = project.add_dependency(host, module).expect("dependency");
        assert_eq!(project.target_dependencies(module), [host]);
        assert!(project.target_dependencies(host).is_empty());
        assert_eq!(
            project.object(dependency).and_then(PbxObject::owner),
            Some(module)
        );
    }

    #[test]
    fn dependency_requires_targets() {
        let mut project = project();
        let host = project.add_native_target(spec("Host", "Host.app"));
        let err = project
            .add_dependency(host, project.root())
            .expect_err("project is not a target");
        assert!(matches!(err, PbxError::UnexpectedObject { .. }));
    }

    #[test]
    fn traversal_visits_every_object_once() {
        let mut project = project();
        project.add_aggregate_target("All", String::from("exit 0"));
        let host = project.add_native_target(spec("Host", "Host.app"));
        let module = project.add_native_target(spec("Tests", "Tests.xctest"));
        project
            .add_source_file("t/a_xctest.mm", "t/a_xctest.mm", CompilerFlags::Help, module)
            .expect("add");
        project.add_dependency(host, module).expect("dependency");

        let order = project.traversal_order();
        let unique: HashSet<NodeId> = order.iter().copied().collect();
        assert_eq!(order.len(), unique.len());
        assert_eq!(order.len(), project.len());
        assert_eq!(order.first(), Some(&project.root()));
    }

    #[test]
    fn product_name_strips_extension_and_directories() {
        assert_eq!(product_name("App.app"), "App");
        assert_eq!(product_name("bin/tool"), "tool");
    }
}
