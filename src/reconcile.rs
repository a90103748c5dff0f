//! Reconciliation of synchronized sources, installed packages and rebuild flags
//!
//! [`reconcile`] is a pure function: it performs no I/O beyond asking the
//! version oracle, and it sorts everything it returns so that the report does
//! not depend on the order of its inputs.

use crate::error::PackageError;
use crate::package::{find, Package, VersionComparator};
use std::collections::BTreeSet;

/// An installed package whose source is newer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpdate {
    pub installed: Package,
    pub available: Package,
}

impl PendingUpdate {
    pub fn name(&self) -> &str {
        self.available.name()
    }
}

/// Everything a run found worth telling the user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    /// Packages whose directories received new commits this run
    pub pulled: Vec<String>,
    /// Sources newer than the installed package
    pub pending: Vec<PendingUpdate>,
    /// Packages flagged by the rebuild detector that were not pulled this run
    pub flagged: Vec<String>,
    pub action_needed: bool,
}

/// Combine the four collections of one run into a [`Report`]
///
/// - `sources`: versions declared by the PKGBUILDs in the AUR directory
/// - `installed`: foreign packages pacman knows about
/// - `pulled`: names of packages synchronized with new commits this run
/// - `flagged`: names the rebuild detector reported
///
/// Sources without an installed counterpart are not reported.
pub fn reconcile(
    sources: &[Package],
    installed: &[Package],
    pulled: &[String],
    flagged: &[String],
    comparator: &dyn VersionComparator,
) -> Result<Report, PackageError> {
    let mut pending = Vec::new();
    for source in sources {
        let Some(current) = find(source.name(), installed) else {
            continue;
        };
        if source.is_newer_than(current, comparator)? {
            pending.push(PendingUpdate {
                installed: current.clone(),
                available: source.clone(),
            });
        }
    }
    pending.sort_by(|a, b| {
        a.available
            .name()
            .cmp(b.available.name())
            .then_with(|| a.available.version().cmp(b.available.version()))
            .then_with(|| a.installed.version().cmp(b.installed.version()))
    });
    pending.dedup();

    let pulled: BTreeSet<&String> = pulled.iter().collect();
    let flagged: Vec<String> = flagged
        .iter()
        .filter(|name| !pulled.contains(name))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .cloned()
        .collect();

    let action_needed = !pending.is_empty() || !flagged.is_empty();

    Ok(Report {
        pulled: pulled.into_iter().cloned().collect(),
        pending,
        flagged,
        action_needed,
    })
}
