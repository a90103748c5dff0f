//! Synchronization of a single package clone with its AUR remote

use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Output;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::error::ToolError;
use crate::manifest::{directory_name, MANIFEST_FILE};
use crate::tool;

/// Git operations for a single package directory, never forcing over local changes
#[derive(Debug, Clone)]
pub struct GitClient {
    fast_forward_only: bool,
}

/// Why a directory cannot be synchronized
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    /// The path does not exist
    MissingPath,
    /// git cannot work inside the path (permissions, ...)
    Unreadable(String),
    /// The path is not the top level of a git working copy
    NotARepository,
    /// The repository has no working tree
    BareRepository,
    /// No remote called "origin" is configured
    NoOrigin,
    /// The working copy has no PKGBUILD
    NoManifest,
    /// Fetching from origin failed (network, auth, removed package, ...)
    FetchFailed(String),
    /// Any other git command failed unexpectedly
    GitFailure(String),
}

impl InvalidReason {
    /// Reasons that are normal inside an AUR directory and need no warning
    pub fn is_expected(&self) -> bool {
        matches!(self, InvalidReason::MissingPath | InvalidReason::NotARepository)
    }
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidReason::MissingPath => f.write_str("directory does not exist"),
            InvalidReason::Unreadable(e) => write!(f, "directory is not accessible: {}", e),
            InvalidReason::NotARepository => f.write_str("not a git repository"),
            InvalidReason::BareRepository => f.write_str("the repository is bare"),
            InvalidReason::NoOrigin => f.write_str("the repository does not have the origin"),
            InvalidReason::NoManifest => write!(f, "no {} found", MANIFEST_FILE),
            InvalidReason::FetchFailed(e) => write!(f, "fetch failed: {}", e),
            InvalidReason::GitFailure(e) => write!(f, "git failed: {}", e),
        }
    }
}

/// Result of synchronizing one directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// New commits were merged; carries the directory name
    Updated(String),
    /// Nothing to merge, or the merge was refused
    Unchanged,
    /// The directory is not a usable package repository
    Invalid(InvalidReason),
    /// The version control tool itself is missing; carries the program name
    ToolUnavailable(String),
}

/// Something that can bring one directory in line with its remote
#[async_trait]
pub trait RepoSynchronizer: Send + Sync {
    async fn synchronize(&self, path: &Path) -> SyncOutcome;
}

/// Internal short-circuit for the step-by-step synchronization
enum Stop {
    Outcome(SyncOutcome),
    Tool(ToolError),
}

impl From<ToolError> for Stop {
    fn from(error: ToolError) -> Self {
        Stop::Tool(error)
    }
}

impl GitClient {
    const PROGRAM: &'static str = "git";

    /// Create a new Git client with the given synchronization settings
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            fast_forward_only: config.fast_forward_only,
        }
    }

    /// Validate, fetch and, when the remote moved, pull one package directory
    pub async fn synchronize_directory(&self, path: &Path) -> SyncOutcome {
        debug!("Checking repo in {}", path.display());

        match self.try_synchronize(path).await {
            Ok(outcome) | Err(Stop::Outcome(outcome)) => outcome,
            Err(Stop::Tool(e)) if e.is_not_installed() => {
                // Also raised when the directory itself cannot be entered.
                if self.is_available().await {
                    SyncOutcome::Invalid(InvalidReason::Unreadable(e.to_string()))
                } else {
                    SyncOutcome::ToolUnavailable(e.program().to_string())
                }
            }
            Err(Stop::Tool(e)) => SyncOutcome::Invalid(InvalidReason::GitFailure(e.to_string())),
        }
    }

    /// Whether git can be launched at all
    pub async fn is_available(&self) -> bool {
        tool::run(Self::PROGRAM, ["--version"], None).await.is_ok()
    }

    async fn try_synchronize(&self, path: &Path) -> Result<SyncOutcome, Stop> {
        self.validate(path).await?;

        let fetch = self.git(path, &["fetch", "origin"]).await?;
        if !fetch.status.success() {
            let stderr = String::from_utf8_lossy(&fetch.stderr).trim().to_string();
            return Err(invalid(InvalidReason::FetchFailed(stderr)));
        }

        let remote_tip = self.rev_parse(path, "FETCH_HEAD").await?;
        let local_tip = self.rev_parse(path, "HEAD").await?;
        if remote_tip == local_tip {
            debug!("Repository is up to date: {}", path.display());
            return Ok(SyncOutcome::Unchanged);
        }

        self.git_pull(path, &local_tip).await
    }

    /// Check that `path` is a non-bare working copy with origin and PKGBUILD
    async fn validate(&self, path: &Path) -> Result<(), Stop> {
        if !path.exists() {
            return Err(invalid(InvalidReason::MissingPath));
        }

        let bare = self.git(path, &["rev-parse", "--is-bare-repository"]).await?;
        if !bare.status.success() {
            return Err(invalid(InvalidReason::NotARepository));
        }
        if String::from_utf8_lossy(&bare.stdout).trim() == "true" {
            return Err(invalid(InvalidReason::BareRepository));
        }

        // A plain folder inside some other checkout is not a package repository.
        let toplevel = self.git(path, &["rev-parse", "--show-toplevel"]).await?;
        if !toplevel.status.success() || !same_directory(path, &stdout_path(&toplevel)) {
            return Err(invalid(InvalidReason::NotARepository));
        }

        let origin = self.git(path, &["remote", "get-url", "origin"]).await?;
        if !origin.status.success() {
            return Err(invalid(InvalidReason::NoOrigin));
        }

        if !path.join(MANIFEST_FILE).is_file() {
            return Err(invalid(InvalidReason::NoManifest));
        }

        Ok(())
    }

    async fn git_pull(&self, path: &Path, local_tip: &str) -> Result<SyncOutcome, Stop> {
        let mut args = vec!["pull"];
        if self.fast_forward_only {
            args.push("--ff-only");
        }
        args.push("origin");

        let output = self.git(path, &args).await?;
        if !output.status.success() {
            // Local changes win over the remote; leave the directory as fetched.
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("Pull refused in {}: {}", path.display(), stderr.trim());
            return Ok(SyncOutcome::Unchanged);
        }

        let new_tip = self.rev_parse(path, "HEAD").await?;
        if new_tip == local_tip {
            debug!("Local branch already contains the remote tip: {}", path.display());
            return Ok(SyncOutcome::Unchanged);
        }

        let name = directory_name(path);
        info!("Pulled {}", name);
        Ok(SyncOutcome::Updated(name))
    }

    async fn rev_parse(&self, path: &Path, revision: &str) -> Result<String, Stop> {
        let output = self.git(path, &["rev-parse", revision]).await?;
        let output = tool::check_status(Self::PROGRAM, output)?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn git(&self, path: &Path, args: &[&str]) -> Result<Output, ToolError> {
        tool::run(Self::PROGRAM, args, Some(path)).await
    }
}

#[async_trait]
impl RepoSynchronizer for GitClient {
    async fn synchronize(&self, path: &Path) -> SyncOutcome {
        self.synchronize_directory(path).await
    }
}

fn invalid(reason: InvalidReason) -> Stop {
    Stop::Outcome(SyncOutcome::Invalid(reason))
}

fn stdout_path(output: &Output) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(&output.stdout).trim())
}

fn same_directory(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::fs;
    use tempfile::TempDir;

    fn client() -> GitClient {
        GitClient::new(&SyncConfig::default())
    }

    #[test]
    fn test_expected_reasons() {
        assert!(InvalidReason::MissingPath.is_expected());
        assert!(!InvalidReason::Unreadable("denied".into()).is_expected());
        assert!(InvalidReason::NotARepository.is_expected());
        assert!(!InvalidReason::BareRepository.is_expected());
        assert!(!InvalidReason::NoOrigin.is_expected());
        assert!(!InvalidReason::NoManifest.is_expected());
        assert!(!InvalidReason::FetchFailed("timeout".into()).is_expected());
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(InvalidReason::NoManifest.to_string(), "no PKGBUILD found");
        assert_eq!(
            InvalidReason::NoOrigin.to_string(),
            "the repository does not have the origin"
        );
    }

    #[tokio::test]
    async fn test_missing_path() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let outcome = client()
            .synchronize(&temp_dir.path().join("gone"))
            .await;

        assert_eq!(outcome, SyncOutcome::Invalid(InvalidReason::MissingPath));
    }

    #[tokio::test]
    async fn test_plain_directory_is_not_a_repository() {
        if tool::run("git", ["--version"], None).await.is_err() {
            return;
        }

        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let dir = temp_dir.path().join("plain");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join(MANIFEST_FILE), "pkgver=1.0\n").unwrap();

        let outcome = client().synchronize(&dir).await;

        assert_matches!(outcome, SyncOutcome::Invalid(InvalidReason::NotARepository));
    }

    #[tokio::test]
    async fn test_locked_directory_is_unreadable_not_missing_git() {
        use std::os::unix::fs::PermissionsExt;

        if nix::unistd::Uid::effective().is_root() || !client().is_available().await {
            return;
        }

        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let dir = temp_dir.path().join("locked-pkg");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join(MANIFEST_FILE), "pkgver=1.0\n").unwrap();
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o000)).unwrap();

        let outcome = client().synchronize(&dir).await;

        fs::set_permissions(&dir, fs::Permissions::from_mode(0o755)).unwrap();
        assert_matches!(outcome, SyncOutcome::Invalid(InvalidReason::Unreadable(_)));
    }
}
