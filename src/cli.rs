//! Command line interface definition using clap.
//!
//! This module defines the [`Cli`] structure and its subcommands.

use crate::synth::{BuildSystem, XcodeWriterOptions};
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// Generates Xcode projects from a resolved GN build graph; builds are
/// delegated to Ninja.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose diagnostic logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print plain status lines instead of progress bars.
    #[arg(long, global = true)]
    pub accessible: bool,

    /// Command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Arguments accepted by the `generate` command.
#[derive(Debug, Args, PartialEq, Eq, Clone)]
pub struct GenerateArgs {
    /// Resolved build graph description (YAML).
    #[arg(long, value_name = "FILE")]
    pub graph: Utf8PathBuf,

    /// Project name; the output is `<build dir>/<NAME>.xcodeproj`.
    #[arg(long, value_name = "NAME", default_value = "all")]
    pub project: String,

    /// Ninja executable invoked by the generated build scripts.
    #[arg(long, value_name = "BIN")]
    pub ninja_executable: Option<String>,

    /// Build system recorded in the workspace settings.
    #[arg(long, value_enum, default_value_t = BuildSystem::Legacy)]
    pub build_system: BuildSystem,

    /// `;`-separated label patterns selecting the targets to include.
    #[arg(long, value_name = "PATTERNS")]
    pub filters: Option<String>,

    /// Ninja target built by the `All` aggregate; empty builds the defaults.
    #[arg(long, value_name = "NAME", default_value = "")]
    pub root_target: String,
}

impl GenerateArgs {
    /// Writer options for these arguments, with the backend already resolved.
    #[must_use]
    pub fn writer_options(&self, ninja_executable: String) -> XcodeWriterOptions {
        XcodeWriterOptions {
            project_name: self.project.clone(),
            ninja_executable: Some(ninja_executable),
            root_target_name: self.root_target.clone(),
            dir_filters: self.filters.clone(),
            build_system: self.build_system,
        }
    }
}

/// Arguments accepted by the `relay` command.
#[derive(Debug, Args, PartialEq, Eq, Clone)]
pub struct RelayArgs {
    /// Source root relative to the build directory, e.g. `../..`.
    #[arg(long, value_name = "REL")]
    pub source_root: String,

    /// Ninja executable to run.
    #[arg(long, value_name = "BIN")]
    pub ninja_executable: Option<String>,

    /// Ninja target to build; defaults to Ninja's default targets.
    #[arg(value_name = "TARGET")]
    pub target: Option<String>,
}

/// Available top-level commands.
#[derive(Debug, Subcommand, PartialEq, Eq, Clone)]
pub enum Commands {
    /// Generate the Xcode project for a build graph.
    Generate(GenerateArgs),

    /// Run Ninja in the current directory with source paths made absolute.
    Relay(RelayArgs),
}
