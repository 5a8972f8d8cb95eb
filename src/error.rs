//! Errors raised while generating a project.
//!
//! Every error is fatal: the pipeline stops at the first one and nothing is
//! written.

use crate::filter::FilterSyntaxError;
use crate::graph::PathError;
use crate::pbx::PbxError;
use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

/// Errors produced by the project generator.
#[derive(Debug, Error, Diagnostic)]
pub enum XcodeError {
    /// The target filter could not be parsed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    FilterSyntax(#[from] FilterSyntaxError),

    /// A test module names a host application that was not materialized.
    #[error("{location}: cannot find host application bundle \"{host}\" for \"{module}\"")]
    #[diagnostic(
        code(pbxgen::xcode::host_application_not_found),
        help("make sure the host application is selected by the target filter")
    )]
    HostApplicationNotFound {
        /// Where the test module is defined.
        location: String,
        /// The test module's label.
        module: String,
        /// The requested host name.
        host: String,
    },

    /// The named host exists but is not an application bundle.
    #[error("{location}: host application target \"{host}\" not an application bundle")]
    #[diagnostic(code(pbxgen::xcode::not_an_application_bundle))]
    NotAnApplicationBundle {
        /// Where the test module is defined.
        location: String,
        /// The requested host name.
        host: String,
    },

    /// An executable's toolchain has no tool producing its final output.
    #[error("{location}: {tool} tool not defined in toolchain `{toolchain}` for `{target}`")]
    #[diagnostic(code(pbxgen::xcode::missing_tool_for_output))]
    MissingToolForOutput {
        /// Where the target is defined.
        location: String,
        /// The required tool.
        tool: String,
        /// The toolchain searched.
        toolchain: String,
        /// The target's label.
        target: String,
    },

    /// A path could not be expressed relative to the build directory.
    #[error(transparent)]
    #[diagnostic(code(pbxgen::xcode::path_resolution))]
    PathResolution(#[from] PathError),

    /// Writing a generated file failed.
    #[error("failed to write `{path}`")]
    #[diagnostic(code(pbxgen::xcode::write_failure))]
    WriteFailure {
        /// Destination path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The test-file walk reached a dependency cycle.
    #[error("dependency cycle while collecting test files: {}", cycle.join(" -> "))]
    #[diagnostic(code(pbxgen::xcode::dependency_cycle))]
    DependencyCycle {
        /// Labels forming the cycle, first repeated at the end.
        cycle: Vec<String>,
    },

    /// The object graph rejected an operation.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Object(#[from] PbxError),

    /// A build script failed to render.
    #[error("failed to render the build script for `{target}`")]
    #[diagnostic(code(pbxgen::xcode::template))]
    Template {
        /// Target the script was for.
        target: String,
        /// Template engine error.
        #[source]
        source: minijinja::Error,
    },
}
