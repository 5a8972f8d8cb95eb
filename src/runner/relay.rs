//! Run Ninja in the build directory and relay its output.
//!
//! Both standard streams are forwarded line by line through a
//! [`SourceRootRewriter`] so diagnostics name absolute source paths. A
//! closed parent stream stops forwarding but the child's output is still
//! drained so Ninja never blocks on a full pipe.

use super::RunnerError;
use crate::rewrite::SourceRootRewriter;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::io::{self, BufRead, BufReader, Write};
use std::process::{Child, Command, ExitCode, ExitStatus, Stdio};
use std::thread;
use tracing::{debug, info, warn};

#[derive(Debug, Default, PartialEq, Eq)]
struct ForwardStats {
    lines: usize,
    write_failed: bool,
}

/// Resolve `source_root` against the working directory.
fn absolute_source_root(source_root: &str) -> Result<Utf8PathBuf> {
    let current = std::env::current_dir().context("reading the working directory")?;
    let cwd = Utf8PathBuf::from_path_buf(current)
        .map_err(|path| anyhow::anyhow!("working directory {} is not UTF-8", path.display()))?;
    cwd.join(Utf8Path::new(source_root))
        .canonicalize_utf8()
        .with_context(|| format!("resolving source root {source_root}"))
}

/// Run `program -C . [target]` and relay its output with `source_root`
/// rewritten to its absolute form.
///
/// # Errors
///
/// Returns an error if the source root cannot be resolved, the backend
/// cannot be spawned or it is terminated by a signal.
pub fn run_relay(program: &str, source_root: &str, target: Option<&str>) -> Result<ExitCode> {
    let absolute = absolute_source_root(source_root)?;
    let rewriter = SourceRootRewriter::new(source_root, absolute.as_str());

    let mut cmd = Command::new(program);
    cmd.arg("-C").arg(".");
    if let Some(name) = target.filter(|name| !name.is_empty()) {
        cmd.arg(name);
    }
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    info!("Running command: {program} -C . {}", target.unwrap_or_default());

    let child = cmd
        .spawn()
        .with_context(|| format!("spawning {program}"))?;
    let status = stream_output(child, &rewriter).with_context(|| format!("running {program}"))?;
    exit_code_for(status, program)
}

fn exit_code_for(status: ExitStatus, program: &str) -> Result<ExitCode> {
    let Some(code) = status.code() else {
        return Err(RunnerError::BackendTerminated {
            program: program.to_owned(),
        }
        .into());
    };
    debug!(code, "backend exited");
    Ok(u8::try_from(code).map_or(ExitCode::FAILURE, ExitCode::from))
}

fn stream_output(mut child: Child, rewriter: &SourceRootRewriter) -> io::Result<ExitStatus> {
    let Some(stdout) = child.stdout.take() else {
        terminate_child(&mut child, "stdout pipe unavailable");
        return Err(io::Error::other("child process missing stdout pipe"));
    };
    let Some(stderr) = child.stderr.take() else {
        terminate_child(&mut child, "stderr pipe unavailable");
        return Err(io::Error::other("child process missing stderr pipe"));
    };

    thread::scope(|scope| {
        let out_handle = scope.spawn(|| {
            let mut lock = io::stdout().lock();
            forward_lines(BufReader::new(stdout), &mut lock, rewriter, "stdout")
        });
        let err_handle = scope.spawn(|| {
            let mut lock = io::stderr().lock();
            forward_lines(BufReader::new(stderr), &mut lock, rewriter, "stderr")
        });
        let status = child.wait();
        log_forwarding_result(out_handle.join(), "stdout");
        log_forwarding_result(err_handle.join(), "stderr");
        status
    })
}

fn log_forwarding_result(result: thread::Result<ForwardStats>, stream_name: &str) {
    match result {
        Ok(stats) if stats.write_failed => {
            debug!("{stream_name} forwarding encountered closed pipe; output truncated");
        }
        Ok(stats) => debug!(lines = stats.lines, "{stream_name} forwarded"),
        Err(err) => warn!("{stream_name} forwarding thread panicked: {err:?}"),
    }
}

fn terminate_child(child: &mut Child, context: &str) {
    if let Err(err) = child.kill() {
        debug!("failed to kill child after {context}: {err}");
    }
    if let Err(err) = child.wait() {
        debug!("failed to reap child after {context}: {err}");
    }
}

/// Copy `reader` to `writer` one line at a time, rewriting each line.
///
/// Invalid UTF-8 is replaced rather than rejected. After a write failure the
/// remaining input is discarded.
fn forward_lines<R, W>(
    mut reader: R,
    mut writer: W,
    rewriter: &SourceRootRewriter,
    stream_name: &'static str,
) -> ForwardStats
where
    R: BufRead,
    W: Write,
{
    let mut stats = ForwardStats::default();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                debug!("Failed to read child {stream_name} output: {err}");
                break;
            }
        }
        let text = String::from_utf8_lossy(&buf);
        let (line, ending) = text
            .strip_suffix('\n')
            .map_or((&*text, ""), |line| (line, "\n"));
        let rewritten = rewriter.rewrite_line(line);
        let result = writer
            .write_all(rewritten.as_bytes())
            .and_then(|()| writer.write_all(ending.as_bytes()))
            .and_then(|()| writer.flush());
        if let Err(err) = result {
            stats.write_failed = true;
            debug!(
                "Failed to write child {stream_name} output to parent: {err}; discarding remaining bytes"
            );
            if let Err(drain_err) = io::copy(&mut reader, &mut io::sink()) {
                debug!("Failed to drain child {stream_name} output after writer closed: {drain_err}");
            }
            break;
        }
        stats.lines += 1;
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn rewriter() -> SourceRootRewriter {
        SourceRootRewriter::new("../..", "/work/src")
    }

    #[test]
    fn rewrites_each_line_and_keeps_line_endings() {
        let input = Cursor::new(b"../../a.cc:1: error\nninja: build stopped".to_vec());
        let mut out = Vec::new();
        let stats = forward_lines(input, &mut out, &rewriter(), "stdout");
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "/work/src/a.cc:1: error\nninja: build stopped"
        );
        assert_eq!(stats, ForwardStats { lines: 2, write_failed: false });
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let input = Cursor::new(vec![b'.', b'.', b'/', b'.', b'.', b'/', 0xff, b'\n']);
        let mut out = Vec::new();
        forward_lines(input, &mut out, &rewriter(), "stderr");
        assert_eq!(String::from_utf8(out).expect("utf8"), "/work/src/\u{fffd}\n");
    }

    #[test]
    fn closed_writer_drains_remaining_input() {
        let mut input = Cursor::new(b"one\ntwo\nthree\n".to_vec());
        let stats = forward_lines(&mut input, ClosedPipe, &rewriter(), "stdout");
        assert!(stats.write_failed);
        assert_eq!(stats.lines, 0);
        assert_eq!(input.position(), 14);
    }

    #[cfg(unix)]
    #[test]
    fn exit_codes_are_passed_through() {
        use std::os::unix::process::ExitStatusExt;

        let code = exit_code_for(ExitStatus::from_raw(3 << 8), "ninja").expect("exit code");
        assert_eq!(code, ExitCode::from(3));
        let signalled = exit_code_for(ExitStatus::from_raw(9), "ninja");
        assert!(signalled.is_err());
    }
}
