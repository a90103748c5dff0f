//! Package identity and version ordering
//!
//! A [`Package`] is a name plus a pacman-style version string
//! (`[epoch:]pkgver`). Two packages are equal only when both fields match.
//! Ordering is only defined between packages with the same name and is
//! delegated to a [`VersionComparator`], normally pacman's `vercmp`.

use crate::error::PackageError;
use crate::tool;
use std::cmp::Ordering;
use std::fmt;

/// Version recorded for a PKGBUILD that declares no `pkgver`
pub const UNKNOWN_VERSION: &str = "NDA";

/// A named package at a specific version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Package {
    name: String,
    version: String,
}

impl Package {
    /// Create a package, normalizing `-` in the version to `_`
    ///
    /// pacman reserves the hyphen as the pkgver/pkgrel separator, so a hyphen
    /// inside a PKGBUILD `pkgver` ends up as an underscore once installed.
    pub fn new(name: impl Into<String>, version: impl AsRef<str>) -> Self {
        Self {
            name: name.into(),
            version: version.as_ref().replace('-', "_"),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Order two versions of the same package
    ///
    /// Returns [`PackageError::ComparisonMismatch`] when the names differ.
    pub fn compare(
        &self,
        other: &Package,
        comparator: &dyn VersionComparator,
    ) -> Result<Ordering, PackageError> {
        if self.name != other.name {
            return Err(PackageError::ComparisonMismatch {
                left: self.name.clone(),
                right: other.name.clone(),
            });
        }

        comparator.compare_versions(&self.version, &other.version)
    }

    pub fn is_newer_than(
        &self,
        other: &Package,
        comparator: &dyn VersionComparator,
    ) -> Result<bool, PackageError> {
        Ok(self.compare(other, comparator)? == Ordering::Greater)
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

/// First package in `packages` called `name`
pub fn find<'a>(name: &str, packages: &'a [Package]) -> Option<&'a Package> {
    packages.iter().find(|package| package.name == name)
}

/// Oracle deciding the order of two version strings
pub trait VersionComparator: Send + Sync {
    fn compare_versions(&self, left: &str, right: &str) -> Result<Ordering, PackageError>;
}

/// Version comparison through pacman's `vercmp` program
///
/// `vercmp` understands epochs, alpha/beta tags and pkgrel the same way
/// pacman does, which a plain string or semver comparison does not.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vercmp;

impl Vercmp {
    const PROGRAM: &'static str = "vercmp";

    pub fn new() -> Self {
        Self
    }
}

impl VersionComparator for Vercmp {
    fn compare_versions(&self, left: &str, right: &str) -> Result<Ordering, PackageError> {
        let output = tool::run_blocking(Self::PROGRAM, [left, right])?;
        let output = tool::check_status(Self::PROGRAM, output)?;
        let stdout = tool::decode_stdout(Self::PROGRAM, output)?;
        parse_vercmp_output(&stdout)
    }
}

fn parse_vercmp_output(stdout: &str) -> Result<Ordering, PackageError> {
    let trimmed = stdout.trim();
    trimmed
        .parse::<i64>()
        .map(|sign| sign.cmp(&0))
        .map_err(|_| PackageError::OracleOutput {
            output: trimmed.to_string(),
        })
}
