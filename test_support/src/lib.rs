//! Test utilities for graph fixtures, fake backends and in-memory output.
//!
//! This crate provides helpers for building graphs, creating fake Ninja
//! executables and capturing generated files without touching the disk.

pub mod env;
pub mod graph;
pub mod writer;

pub use graph::{label, load_graph};
pub use writer::MemoryWriter;

use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a fake Ninja executable running `body` as a shell script.
///
/// Returns the temporary directory and the path to the executable.
pub fn fake_ninja(body: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("ninja");
    let mut file = File::create(&path).expect("script");
    writeln!(file, "#!/bin/sh\n{body}").expect("write script");
    drop(file);
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(&path).expect("meta").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).expect("perms");
    }
    (dir, path)
}

/// Create a fake Ninja executable that exits with `exit_code`.
pub fn fake_ninja_exit(exit_code: i32) -> (TempDir, PathBuf) {
    fake_ninja(&format!("exit {exit_code}"))
}
