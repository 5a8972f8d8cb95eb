//! CLI execution and command dispatch logic.
//!
//! This module keeps `main` minimal by providing a single entry point that
//! handles command execution. `generate` loads the build graph and writes
//! the Xcode project; `relay` runs Ninja on behalf of the generated build
//! scripts and streams its output back with source paths made absolute.

mod error;
mod relay;

pub use error::RunnerError;
pub use relay::run_relay;

use crate::cli::{Cli, Commands, GenerateArgs};
use crate::graph::load;
use crate::status::{AccessibleReporter, IndicatifReporter, StatusReporter};
use crate::synth::XcodeProject;
use crate::write::{CapStdWriter, WriteOutcome};
use anyhow::{Context, Result};
use mockable::{DefaultEnv, Env};
use ninja_env::{DEFAULT_NINJA, NINJA_ENV};
use std::process::ExitCode;
use tracing::{debug, info};

/// Build the appropriate [`StatusReporter`] for the requested output mode.
fn make_reporter(accessible: bool) -> Box<dyn StatusReporter> {
    if accessible {
        Box::new(AccessibleReporter)
    } else {
        Box::new(IndicatifReporter::new())
    }
}

/// Pick the Ninja executable: the command-line value, then [`NINJA_ENV`],
/// then `ninja`. Empty values count as unset.
///
/// # Examples
///
/// ```
/// use mockable::DefaultEnv;
/// use pbxgen::runner::resolve_ninja_executable;
///
/// let env = DefaultEnv::new();
/// assert_eq!(resolve_ninja_executable(Some("/opt/ninja"), &env), "/opt/ninja");
/// ```
#[must_use]
pub fn resolve_ninja_executable<E: Env + ?Sized>(flag: Option<&str>, env: &E) -> String {
    flag.filter(|value| !value.is_empty())
        .map(str::to_owned)
        .or_else(|| env.raw(NINJA_ENV).ok().filter(|value| !value.is_empty()))
        .unwrap_or_else(|| DEFAULT_NINJA.to_owned())
}

/// Execute the parsed [`Cli`] command.
///
/// The returned exit code is the backend's for `relay` and success for
/// `generate`.
///
/// # Errors
///
/// Returns an error if the graph cannot be loaded, generation fails, the
/// project cannot be written or the backend cannot be run.
pub fn run(cli: &Cli) -> Result<ExitCode> {
    let env = DefaultEnv::new();
    match &cli.command {
        Commands::Generate(args) => {
            let reporter = make_reporter(cli.accessible);
            handle_generate(args, &env, reporter.as_ref())?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Relay(args) => {
            let program = resolve_ninja_executable(args.ninja_executable.as_deref(), &env);
            run_relay(&program, &args.source_root, args.target.as_deref())
        }
    }
}

/// Load the graph named by `args`, generate the project and write it.
///
/// # Errors
///
/// Returns an error if any step fails; nothing is written unless generation
/// succeeded.
fn handle_generate<E: Env + ?Sized>(
    args: &GenerateArgs,
    env: &E,
    reporter: &dyn StatusReporter,
) -> Result<()> {
    if !args.graph.is_file() {
        return Err(RunnerError::GraphNotFound {
            path: args.graph.clone(),
        }
        .into());
    }
    let graph = load::from_path(&args.graph)
        .with_context(|| format!("loading build graph {}", args.graph))?;
    let options = args.writer_options(resolve_ninja_executable(
        args.ninja_executable.as_deref(),
        env,
    ));

    let project = XcodeProject::generate(&graph, &graph, &options, env, reporter)
        .with_context(|| format!("generating project {}", options.project_name))?;
    if tracing::enabled!(tracing::Level::DEBUG) {
        let labels: Vec<String> = project
            .selected_targets()
            .iter()
            .map(ToString::to_string)
            .collect();
        let json = serde_json::to_string_pretty(&labels).context("serialising selected targets")?;
        debug!("Selected targets:\n{json}");
    }

    let written = project
        .write_files(&mut CapStdWriter::new(), reporter)
        .with_context(|| format!("writing {}", project.project_dir()))?;
    let changed = written
        .iter()
        .filter(|(_, outcome)| *outcome == WriteOutcome::Written)
        .count();
    info!(project = %project.project_dir(), changed, "project generated");
    reporter.report_complete(&format!("Generated {}", project.project_dir()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockable::MockEnv;
    use rstest::rstest;

    fn env_with_override(value: Option<&'static str>) -> MockEnv {
        let mut env = MockEnv::new();
        env.expect_raw().returning(move |key| {
            if key == NINJA_ENV {
                value
                    .map(str::to_owned)
                    .ok_or(std::env::VarError::NotPresent)
            } else {
                Err(std::env::VarError::NotPresent)
            }
        });
        env
    }

    #[rstest]
    #[case(Some("/opt/ninja"), Some("/usr/bin/ninja"), "/opt/ninja")]
    #[case(None, Some("/usr/bin/ninja"), "/usr/bin/ninja")]
    #[case(Some(""), Some("/usr/bin/ninja"), "/usr/bin/ninja")]
    #[case(None, Some(""), "ninja")]
    #[case(None, None, "ninja")]
    fn ninja_executable_precedence(
        #[case] flag: Option<&str>,
        #[case] env_value: Option<&'static str>,
        #[case] expected: &str,
    ) {
        let env = env_with_override(env_value);
        assert_eq!(resolve_ninja_executable(flag, &env), expected);
    }

    #[test]
    fn missing_graph_is_reported() {
        let args = GenerateArgs {
            graph: camino::Utf8PathBuf::from("/definitely/not/here/graph.yml"),
            project: String::from("all"),
            ninja_executable: None,
            build_system: crate::synth::BuildSystem::Legacy,
            filters: None,
            root_target: String::new(),
        };
        let env = env_with_override(None);
        let err = handle_generate(&args, &env, &crate::status::SilentReporter)
            .expect_err("missing graph should fail");
        assert!(matches!(
            err.downcast_ref::<RunnerError>(),
            Some(RunnerError::GraphNotFound { .. })
        ));
    }
}
