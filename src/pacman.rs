//! Installed foreign packages, as reported by `pacman -Qm`

use crate::error::ToolError;
use crate::package::Package;
use crate::tool;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, warn};

const PROGRAM: &str = "pacman";

/// Suffix of split debug packages, which share a source with the main package
const DEBUG_SUFFIX: &str = "-debug";

// <name> <pkgver>-<pkgrel>
static PACKAGE_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+) (.+)-\d+$").unwrap());

/// Parse `pacman -Qm` output into packages
///
/// Lines that do not look like `<name> <version>-<rel>` are skipped.
pub fn parse_foreign_packages(output: &str) -> Vec<Package> {
    let mut seen = HashSet::new();
    let mut packages = Vec::new();

    for line in output.lines() {
        let Some(captures) = PACKAGE_LINE_RE.captures(line.trim()) else {
            continue;
        };
        let name = &captures[1];
        let name = name.strip_suffix(DEBUG_SUFFIX).unwrap_or(name);
        let package = Package::new(name, &captures[2]);

        if seen.insert(package.clone()) {
            packages.push(package);
        }
    }

    packages
}

/// Ask pacman for the locally installed packages that are not in any repository
pub async fn query_foreign_packages() -> Result<Vec<Package>, ToolError> {
    let output = tool::run(PROGRAM, ["-Qm"], None).await?;
    let output = tool::check_status(PROGRAM, output)?;
    let stdout = tool::decode_stdout(PROGRAM, output)?;

    let packages = parse_foreign_packages(&stdout);
    debug!("pacman reports {} foreign packages", packages.len());
    Ok(packages)
}

/// Installed foreign packages for reconciliation
///
/// Output that is not valid UTF-8 is reported and treated as no packages;
/// every other failure is returned.
pub async fn installed_packages() -> Result<Vec<Package>, ToolError> {
    tolerate_decode_failure(query_foreign_packages().await)
}

fn tolerate_decode_failure(
    result: Result<Vec<Package>, ToolError>,
) -> Result<Vec<Package>, ToolError> {
    match result {
        Err(e @ ToolError::Decode { .. }) => {
            warn!("Ignoring installed packages, {}", e);
            Ok(Vec::new())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn decode_error() -> ToolError {
        ToolError::Decode {
            program: PROGRAM.to_string(),
            source: String::from_utf8(vec![0xff, 0xfe]).unwrap_err(),
        }
    }

    #[test]
    fn test_parse_foreign_packages() {
        let output = "\
yay 12.3.5-1
zoxide-git 0.9.4.r12.gabcdef-2
foo-bin 3:1.2.0_bin-1
";
        let packages = parse_foreign_packages(output);

        assert_eq!(
            packages,
            vec![
                Package::new("yay", "12.3.5"),
                Package::new("zoxide-git", "0.9.4.r12.gabcdef"),
                Package::new("foo-bin", "3:1.2.0_bin"),
            ]
        );
    }

    #[test]
    fn test_debug_suffix_is_stripped_and_collapsed() {
        let output = "paru 2.0.3-1\nparu-debug 2.0.3-1\n";

        assert_eq!(
            parse_foreign_packages(output),
            vec![Package::new("paru", "2.0.3")]
        );
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let output = "\
warning: database file for 'extra' does not exist
lonely
spaced name-without-rel

yay 12.3.5-1
";
        assert_eq!(
            parse_foreign_packages(output),
            vec![Package::new("yay", "12.3.5")]
        );
    }

    #[test]
    fn test_empty_output() {
        assert!(parse_foreign_packages("").is_empty());
    }

    #[test]
    fn test_undecodable_output_counts_as_no_packages() {
        let result = tolerate_decode_failure(Err(decode_error()));

        assert_matches!(result, Ok(ref packages) if packages.is_empty());
    }

    #[test]
    fn test_other_failures_are_returned() {
        let failed = ToolError::Failed {
            program: PROGRAM.to_string(),
            status: "exit status: 1".to_string(),
            stderr: "error: could not open database".to_string(),
        };

        assert_matches!(
            tolerate_decode_failure(Err(failed)),
            Err(ToolError::Failed { .. })
        );
        assert_eq!(
            tolerate_decode_failure(Ok(vec![Package::new("yay", "12.3.5")])).unwrap(),
            vec![Package::new("yay", "12.3.5")]
        );
    }
}
