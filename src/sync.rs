//! Sync Engine - Orchestrates parallel synchronization of the AUR directory
//!
//! Every immediate subdirectory of the AUR directory is handed to a
//! [`RepoSynchronizer`] on a bounded pool. A broken directory is recorded and
//! skipped; a missing version control tool stops the whole run.

use crate::config::SyncConfig;
use crate::error::FleetError;
use crate::git::{GitClient, InvalidReason, RepoSynchronizer, SyncOutcome};
use crate::manifest;
use crate::package::Package;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

/// Results from synchronizing the whole AUR directory
#[derive(Debug, Clone, Default)]
pub struct FleetSummary {
    /// Packages whose directory received new commits, as declared after the pull
    pub updated: HashSet<Package>,
    pub unchanged: usize,
    /// Directories that could not be synchronized, and why
    pub invalid: Vec<(PathBuf, InvalidReason)>,
    pub duration: Duration,
}

impl FleetSummary {
    /// Names of the updated packages, sorted
    pub fn updated_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .updated
            .iter()
            .map(|package| package.name().to_string())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

/// Runs one synchronization per package directory with bounded concurrency
pub struct SyncEngine<S = GitClient> {
    synchronizer: Arc<S>,
    max_parallel: usize,
}

impl SyncEngine<GitClient> {
    /// Create a sync engine backed by git
    pub fn new(config: &SyncConfig) -> Self {
        Self::with_synchronizer(GitClient::new(config), config.max_parallel)
    }
}

impl<S> SyncEngine<S>
where
    S: RepoSynchronizer + 'static,
{
    pub fn with_synchronizer(synchronizer: S, max_parallel: usize) -> Self {
        Self {
            synchronizer: Arc::new(synchronizer),
            max_parallel: max_parallel.max(1),
        }
    }

    /// Synchronize every package directory under `root`
    ///
    /// Returns [`FleetError::ToolUnavailable`] as soon as any worker reports
    /// that the version control tool is missing. Work that has not started
    /// yet is abandoned and the results of work already in flight are
    /// discarded.
    pub async fn synchronize_all(&self, root: &Path) -> Result<FleetSummary, FleetError> {
        let start_time = Instant::now();
        let dirs = list_package_dirs(root).await?;

        info!(
            "Synchronizing {} package directories with concurrency {}",
            dirs.len(),
            self.max_parallel
        );

        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let mut futures = FuturesUnordered::new();

        for dir in dirs {
            let semaphore = semaphore.clone();
            let synchronizer = self.synchronizer.clone();

            futures.push(async move {
                // A closed semaphore means the run was aborted before this
                // directory got its turn. A permit handed over just before the
                // close still counts as aborted.
                let Ok(_permit) = semaphore.acquire().await else {
                    return (dir, None);
                };
                if semaphore.is_closed() {
                    return (dir, None);
                }
                let outcome = synchronizer.synchronize(&dir).await;
                (dir, Some(outcome))
            });
        }

        let mut summary = FleetSummary::default();
        let mut missing_tool: Option<String> = None;

        while let Some((dir, outcome)) = futures.next().await {
            let Some(outcome) = outcome else {
                continue;
            };

            if missing_tool.is_some() {
                debug!("Discarding result for {} after fatal error", dir.display());
                continue;
            }

            match outcome {
                SyncOutcome::ToolUnavailable(program) => {
                    error!("{} is not available, aborting synchronization", program);
                    semaphore.close();
                    missing_tool = Some(program);
                }
                SyncOutcome::Updated(name) => match manifest::read_package(&dir).await {
                    Ok(package) => {
                        debug!("Updated {} to {}", name, package.version());
                        summary.updated.insert(package);
                    }
                    Err(e) => {
                        warn!("Pulled {} but cannot read its manifest: {}", name, e);
                        summary.invalid.push((dir, InvalidReason::NoManifest));
                    }
                },
                SyncOutcome::Unchanged => summary.unchanged += 1,
                SyncOutcome::Invalid(reason) => {
                    if reason.is_expected() {
                        debug!("Skipping {}: {}", dir.display(), reason);
                    } else {
                        warn!("Skipping {}: {}", dir.display(), reason);
                    }
                    summary.invalid.push((dir, reason));
                }
            }
        }

        if let Some(program) = missing_tool {
            return Err(FleetError::ToolUnavailable { program });
        }

        summary.invalid.sort_by(|a, b| a.0.cmp(&b.0));
        summary.duration = start_time.elapsed();

        info!(
            "Sync completed in {:.2}s: {} updated, {} unchanged, {} skipped",
            summary.duration.as_secs_f64(),
            summary.updated.len(),
            summary.unchanged,
            summary.invalid.len()
        );

        Ok(summary)
    }
}

/// Immediate subdirectories of `root`, sorted by path
///
/// Files and symbolic links (even ones pointing at directories) are left out.
pub async fn list_package_dirs(root: &Path) -> Result<Vec<PathBuf>, FleetError> {
    let read_root = |source| FleetError::ReadRoot {
        path: root.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(root).await.map_err(read_root)?;
    let mut dirs = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(read_root)? {
        // DirEntry::file_type does not follow symlinks.
        match entry.file_type().await {
            Ok(file_type) if file_type.is_dir() => dirs.push(entry.path()),
            Ok(_) => {}
            Err(e) => warn!("Cannot inspect {}: {}", entry.path().display(), e),
        }
    }

    dirs.sort();
    Ok(dirs)
}
