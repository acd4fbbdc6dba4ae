#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

const VIDVAULT: &str = env!("CARGO_BIN_EXE_vidvault");
const TMP_DIR: &str = env!("CARGO_TARGET_TMPDIR");

#[derive(Debug)]
pub struct Output {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Runs the `vidvault` binary with `args`, capturing its exit code and both
/// streams. `NO_COLOR` is set so assertions on stderr text don't have to
/// strip ANSI escapes.
pub fn run(args: &[&str]) -> Output {
    let mut command = Command::new(VIDVAULT);
    command.env("NO_COLOR", "1");
    command.env_remove("RUST_LOG");

    for arg in args {
        command.arg(arg);
    }

    let output = command.output().unwrap();

    Output {
        exit_code: output.status.code().unwrap(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    }
}

/// Writes `contents` to a fresh path under the shared test target dir and
/// returns it.
pub fn write_temp_file(file_name: &str, contents: &[u8]) -> PathBuf {
    let path = Path::new(TMP_DIR).join(file_name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// A path under the shared test target dir that doesn't exist yet, for
/// commands that only write to it.
pub fn temp_path(file_name: &str) -> PathBuf {
    Path::new(TMP_DIR).join(file_name)
}

/// Whether `command` resolves on `PATH`, used to skip (not fail) tests that
/// need `ffmpeg` and a barcode tool.
pub fn command_exists(command: &str) -> bool {
    Command::new(command)
        .arg("-h")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .is_ok()
}

pub fn checksum(path: &Path) -> String {
    let payload = std::fs::read(path).unwrap();
    let hash = blake3::hash(&payload);
    // Hexadecimal is nicer to debug than plain bytes.
    hash.to_hex().to_string()
}
