//! PKGBUILD reading
//!
//! Only the two assignments that make up a package version are looked at:
//! `pkgver=` and the optional `epoch=`. The first occurrence of each wins and
//! they may appear in any order. The package name always comes from the
//! directory, never from the PKGBUILD itself.

use crate::error::FleetError;
use crate::package::{Package, UNKNOWN_VERSION};
use crate::sync::list_package_dirs;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// File name of the build manifest inside every package directory
pub const MANIFEST_FILE: &str = "PKGBUILD";

static PKGVER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*pkgver=(.*)$").unwrap());

static EPOCH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*epoch=(.*)$").unwrap());

/// Extract `[epoch:]pkgver` from PKGBUILD text
///
/// Returns [`UNKNOWN_VERSION`] when no `pkgver=` line exists.
pub fn parse_version(text: &str) -> String {
    let mut pkgver: Option<&str> = None;
    let mut epoch: Option<&str> = None;

    for line in text.lines() {
        if pkgver.is_none() {
            if let Some(captures) = PKGVER_RE.captures(line) {
                pkgver = captures.get(1).map(|m| unquote(m.as_str()));
                continue;
            }
        }
        if epoch.is_none() {
            if let Some(captures) = EPOCH_RE.captures(line) {
                epoch = captures.get(1).map(|m| unquote(m.as_str()));
            }
        }
        if pkgver.is_some() && epoch.is_some() {
            break;
        }
    }

    match (pkgver, epoch) {
        (Some(pkgver), Some(epoch)) if !epoch.is_empty() => format!("{epoch}:{pkgver}"),
        (Some(pkgver), _) => pkgver.to_string(),
        (None, _) => UNKNOWN_VERSION.to_string(),
    }
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value)
}

/// Read the package declared by the PKGBUILD in `dir`
pub async fn read_package(dir: &Path) -> std::io::Result<Package> {
    let text = tokio::fs::read_to_string(dir.join(MANIFEST_FILE)).await?;
    let package = Package::new(directory_name(dir), parse_version(&text));
    debug!("Read {} from {}", package, dir.display());
    Ok(package)
}

/// Read the source version of every package directory under `root`
///
/// A directory whose PKGBUILD cannot be read is skipped with a warning so
/// that one broken checkout does not hide the others.
pub async fn collect_sources(root: &Path) -> Result<Vec<Package>, FleetError> {
    let mut packages = Vec::new();

    for dir in list_package_dirs(root).await? {
        match read_package(&dir).await {
            Ok(package) => packages.push(package),
            Err(e) => warn!("Skipping {}: cannot read {}: {}", dir.display(), MANIFEST_FILE, e),
        }
    }

    packages.sort_by(|a, b| a.name().cmp(b.name()));
    Ok(packages)
}

/// Final path component as a package name
pub(crate) fn directory_name(dir: &Path) -> String {
    dir.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.to_string_lossy().into_owned())
}
