//! Build delegation scripts.
//!
//! Each generated target runs a small Python script instead of compiling
//! anything itself. The script invokes Ninja in the build directory, streams
//! its combined output and rewrites relative source paths to absolute ones
//! so the IDE can link diagnostics back to files. The script text is
//! rendered from a `minijinja` template.

use minijinja::Environment;
use mockable::Env;
use ninja_env::DEFAULT_NINJA;

const BUILD_SCRIPT_TEMPLATE: &str = r#"import os
import re
import subprocess
import sys

rel_root_src = {{ rel_root_src }}
abs_root_src = os.path.abspath(rel_root_src)

build_target = {{ build_target }}
ninja_binary = {{ ninja_binary }}
ninja_params = ['-C', '.']

{{ environ }}

if build_target:
  ninja_params.append(build_target)
  print('Compile "' + build_target + '" via ninja')
else:
  print('Compile "all" via ninja')

process = subprocess.Popen(
    [ninja_binary] + ninja_params,
    stdout=subprocess.PIPE,
    stderr=subprocess.STDOUT,
    universal_newlines=True,
    encoding='utf-8',
    env=environ)

pattern = re.compile('(?<!/)' + re.escape(rel_root_src))

for line in iter(process.stdout.readline, ''):
  while True:
    match = pattern.search(line)
    if not match:
      break
    span = match.span()
    print(line[:span[0]], end='')
    print(abs_root_src, end='')
    line = line[span[1]:]
  print(line, flush=True, end='')

process.wait()

sys.exit(process.returncode)
"#;

/// How an allow-listed environment variable reaches the build script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// Embed the value seen when the project is generated.
    AtGeneration,
    /// Look the value up when the script runs.
    AtRunTime,
}

/// Environment variables forwarded to the build backend.
pub const SAFE_ENVIRONMENT_VARIABLES: [(&str, CaptureMode); 7] = [
    ("HOME", CaptureMode::AtGeneration),
    ("LANG", CaptureMode::AtGeneration),
    ("PATH", CaptureMode::AtGeneration),
    ("USER", CaptureMode::AtGeneration),
    ("TMPDIR", CaptureMode::AtRunTime),
    ("ICECC_VERSION", CaptureMode::AtGeneration),
    ("ICECC_CLANG_REMOTE_CPP", CaptureMode::AtGeneration),
];

/// The `environ` block of a build script.
///
/// Captured once per generation and shared by every script in the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptEnvironment(String);

impl ScriptEnvironment {
    /// Capture the allow-listed variables from `env`.
    ///
    /// Missing variables are embedded as empty strings.
    #[must_use]
    pub fn capture<E: Env + ?Sized>(env: &E) -> Self {
        let mut block = String::from("environ = {}");
        for (name, mode) in SAFE_ENVIRONMENT_VARIABLES {
            block.push('\n');
            let value = match mode {
                CaptureMode::AtGeneration => python_literal(&env.raw(name).unwrap_or_default()),
                CaptureMode::AtRunTime => format!("os.environ.get('{name}', '')"),
            };
            block.push_str(&format!("environ['{name}'] = {value}"));
        }
        Self(block)
    }

    /// The rendered Python statements.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Quote `value` as a single-quoted Python string literal.
///
/// # Examples
///
/// ```
/// use pbxgen::script::python_literal;
///
/// assert_eq!(python_literal("it's"), r"'it\'s'");
/// ```
#[must_use]
pub fn python_literal(value: &str) -> String {
    let mut literal = String::with_capacity(value.len() + 2);
    literal.push('\'');
    for c in value.chars() {
        match c {
            '\\' => literal.push_str("\\\\"),
            '\'' => literal.push_str("\\'"),
            '\n' => literal.push_str("\\n"),
            '\r' => literal.push_str("\\r"),
            other => literal.push(other),
        }
    }
    literal.push('\'');
    literal
}

/// The backend executable, falling back to `ninja` when unset or empty.
#[must_use]
pub fn ninja_executable_or_default(configured: Option<&str>) -> &str {
    configured.filter(|exe| !exe.is_empty()).unwrap_or(DEFAULT_NINJA)
}

/// Render the build script for `target_name`.
///
/// An empty `target_name` builds Ninja's default targets. `root_src_dir` is
/// the source root relative to the build directory.
///
/// # Errors
///
/// Returns the template engine's error if rendering fails.
pub fn build_script(
    target_name: &str,
    ninja_executable: &str,
    root_src_dir: &str,
    environment: &ScriptEnvironment,
) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    env.render_str(
        BUILD_SCRIPT_TEMPLATE,
        minijinja::context! {
            rel_root_src => python_literal(root_src_dir),
            build_target => python_literal(target_name),
            ninja_binary => python_literal(ninja_executable),
            environ => environment.as_str(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockable::MockEnv;
    use rstest::{fixture, rstest};
    use std::env::VarError;

    #[fixture]
    fn empty_env() -> MockEnv {
        let mut env = MockEnv::new();
        env.expect_raw().returning(|_| Err(VarError::NotPresent));
        env
    }

    #[rstest]
    fn missing_variables_become_empty_strings(empty_env: MockEnv) {
        let environment = ScriptEnvironment::capture(&empty_env);
        assert!(environment.as_str().starts_with("environ = {}\n"));
        assert!(environment.as_str().contains("environ['HOME'] = ''"));
        assert!(
            environment
                .as_str()
                .contains("environ['TMPDIR'] = os.environ.get('TMPDIR', '')")
        );
    }

    #[rstest]
    #[case("plain", "'plain'")]
    #[case(r"C:\tmp", r"'C:\\tmp'")]
    #[case("a'b", r"'a\'b'")]
    fn quotes_python_literals(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(python_literal(input), expected);
    }

    #[rstest]
    #[case(None, "ninja")]
    #[case(Some(""), "ninja")]
    #[case(Some("/opt/bin/ninja"), "/opt/bin/ninja")]
    fn backend_defaults_to_ninja(#[case] configured: Option<&str>, #[case] expected: &str) {
        assert_eq!(ninja_executable_or_default(configured), expected);
    }

    #[rstest]
    fn script_embeds_target_backend_and_root(empty_env: MockEnv) {
        let environment = ScriptEnvironment::capture(&empty_env);
        let script = build_script("base_unittests", "ninja", "../..", &environment)
            .expect("render");
        assert!(script.contains("rel_root_src = '../..'\n"));
        assert!(script.contains("build_target = 'base_unittests'\n"));
        assert!(script.contains("ninja_binary = 'ninja'\n"));
        assert!(script.contains("environ['PATH'] = ''\n"));
        assert!(script.ends_with("sys.exit(process.returncode)\n"));
    }

    #[rstest]
    fn empty_target_builds_everything(empty_env: MockEnv) {
        let environment = ScriptEnvironment::capture(&empty_env);
        let script = build_script("", "ninja", "../..", &environment).expect("render");
        assert!(script.contains("build_target = ''\n"));
    }
}
