//! Error types shared across the checker
//!
//! Error hierarchy:
//! - ToolError: an external program could not be launched, failed, or printed garbage
//! - PackageError: comparing two packages went wrong
//! - FleetError: synchronizing the whole AUR directory had to stop

use std::path::PathBuf;
use thiserror::Error;

/// Failure to use an external program (git, pacman, vercmp, checkrebuild)
#[derive(Error, Debug)]
pub enum ToolError {
    /// The program could not be spawned at all
    #[error("{program} could not be launched, it is probably not installed")]
    NotInstalled {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran but exited unsuccessfully
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    /// The program's output is not valid UTF-8
    #[error("output of {program} could not be decoded as UTF-8")]
    Decode {
        program: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

impl ToolError {
    /// Name of the program this error is about
    pub fn program(&self) -> &str {
        match self {
            ToolError::NotInstalled { program, .. }
            | ToolError::Failed { program, .. }
            | ToolError::Decode { program, .. } => program,
        }
    }

    /// Whether the program itself is missing, as opposed to misbehaving
    pub fn is_not_installed(&self) -> bool {
        matches!(self, ToolError::NotInstalled { .. })
    }
}

/// Errors raised while comparing package versions
#[derive(Error, Debug)]
pub enum PackageError {
    /// Ordering two packages that do not share a name is a caller bug
    #[error("cannot compare versions of different packages: {left} and {right}")]
    ComparisonMismatch { left: String, right: String },

    /// The version oracle could not be used
    #[error(transparent)]
    Oracle(#[from] ToolError),

    /// The version oracle printed something that is not a signed integer
    #[error("unexpected vercmp output: {output:?}")]
    OracleOutput { output: String },
}

/// Errors that stop a synchronization of the whole AUR directory
#[derive(Error, Debug)]
pub enum FleetError {
    /// The version control tool is missing, so no directory can be synchronized
    #[error("{program} could not be launched, it is probably not installed")]
    ToolUnavailable { program: String },

    /// The AUR directory itself could not be listed
    #[error("failed to read AUR directory {path}: {source}")]
    ReadRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
