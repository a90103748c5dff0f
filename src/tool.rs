//! Thin wrappers around spawning external programs
//!
//! Every external tool the checker talks to goes through here so that
//! "the program is not installed" is always told apart from "the program
//! ran and failed".

use crate::error::ToolError;
use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::Path;
use std::process::{Command, Output};
use tokio::process::Command as AsyncCommand;
use tracing::debug;

/// Run a program to completion and capture its output
///
/// A non-zero exit status is not an error here; callers decide what it means.
pub async fn run<I, S>(program: &str, args: I, cwd: Option<&Path>) -> Result<Output, ToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = AsyncCommand::new(program);
    command.args(args).kill_on_drop(true);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    debug!("Running {} in {:?}", program, cwd);
    command
        .output()
        .await
        .map_err(|source| spawn_error(program, source))
}

/// Blocking counterpart of [`run`] for synchronous call sites
pub fn run_blocking<I, S>(program: &str, args: I) -> Result<Output, ToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    Command::new(program)
        .args(args)
        .output()
        .map_err(|source| spawn_error(program, source))
}

/// Turn an unsuccessful exit into [`ToolError::Failed`]
pub fn check_status(program: &str, output: Output) -> Result<Output, ToolError> {
    if output.status.success() {
        return Ok(output);
    }

    Err(ToolError::Failed {
        program: program.to_string(),
        status: output.status.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

/// Decode captured stdout as UTF-8
pub fn decode_stdout(program: &str, output: Output) -> Result<String, ToolError> {
    String::from_utf8(output.stdout).map_err(|source| ToolError::Decode {
        program: program.to_string(),
        source,
    })
}

fn spawn_error(program: &str, source: std::io::Error) -> ToolError {
    match source.kind() {
        ErrorKind::NotFound | ErrorKind::PermissionDenied => ToolError::NotInstalled {
            program: program.to_string(),
            source,
        },
        // Anything else still means the program never ran.
        _ => ToolError::Failed {
            program: program.to_string(),
            status: "spawn failure".to_string(),
            stderr: source.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn test_missing_program_is_not_installed() {
        let result = run("aurcheck-definitely-missing-program", ["--version"], None).await;

        assert_matches!(result, Err(ToolError::NotInstalled { .. }));
    }

    #[test]
    fn test_missing_program_is_not_installed_blocking() {
        let result = run_blocking("aurcheck-definitely-missing-program", ["1", "2"]);

        assert_matches!(result, Err(ToolError::NotInstalled { ref program, .. }) if program == "aurcheck-definitely-missing-program");
    }

    #[tokio::test]
    async fn test_failed_exit_status() {
        let output = run("sh", ["-c", "echo oops >&2; exit 3"], None)
            .await
            .expect("sh should be available");

        let result = check_status("sh", output);
        assert_matches!(result, Err(ToolError::Failed { ref stderr, .. }) if stderr == "oops");
    }

    #[tokio::test]
    async fn test_decode_rejects_invalid_utf8() {
        let output = run("sh", ["-c", "printf '\\377\\376'"], None)
            .await
            .expect("sh should be available");

        assert_matches!(decode_stdout("sh", output), Err(ToolError::Decode { .. }));
    }
}
