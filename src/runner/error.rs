//! Error types for the runner module.
//!
//! This submodule isolates derive-macro-affected code to scope lint suppressions
//! narrowly. The `unused_assignments` lint fires in some Rust versions due to
//! thiserror/miette derive macro expansion.

// Scoped suppression for version-dependent lint false positives from
// miette/thiserror derive macros.
// FIXME(rust-lang/rust#130021): remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

/// Errors raised during command execution.
#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    /// The graph description does not exist.
    #[error("build graph `{path}` not found")]
    #[diagnostic(
        code(pbxgen::runner::graph_not_found),
        help("pass the resolved graph description with --graph")
    )]
    GraphNotFound {
        /// The path that was attempted.
        path: Utf8PathBuf,
    },

    /// The backend exited without a status code.
    #[error("`{program}` was terminated by a signal")]
    #[diagnostic(code(pbxgen::runner::backend_terminated))]
    BackendTerminated {
        /// The backend executable.
        program: String,
    },
}
