//! Rebuild detection through `checkrebuild` (from rebuild-detector)
//!
//! `checkrebuild` prints one `<repository>\t<package>` line per package whose
//! linked libraries moved underneath it. Only packages from the `foreign`
//! pseudo-repository are built from AUR sources, so only those are kept.

use crate::error::ToolError;
use crate::tool;
use std::collections::HashSet;
use tracing::debug;

const PROGRAM: &str = "checkrebuild";
const FOREIGN_PREFIX: &str = "foreign\t";

/// Package names from `checkrebuild` output, in order of first appearance
pub fn parse_flagged(output: &str) -> Vec<String> {
    let mut seen = HashSet::new();

    output
        .lines()
        .filter_map(|line| line.strip_prefix(FOREIGN_PREFIX))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.to_string()))
        .map(str::to_string)
        .collect()
}

/// Run `checkrebuild` and return the foreign packages it flags
pub async fn detect_rebuilds() -> Result<Vec<String>, ToolError> {
    let output = tool::run(PROGRAM, std::iter::empty::<&str>(), None).await?;
    let output = tool::check_status(PROGRAM, output)?;
    let stdout = tool::decode_stdout(PROGRAM, output)?;

    let flagged = parse_flagged(&stdout);
    debug!("{} flagged {} packages", PROGRAM, flagged.len());
    Ok(flagged)
}

/// Text listing the flagged packages, empty when there are none
pub fn render_flagged(flagged: &[String]) -> String {
    if flagged.is_empty() {
        return String::new();
    }

    let mut text = String::from("The following packages might need to be rebuilt:\n");
    for name in flagged {
        text.push('\t');
        text.push_str(name);
        text.push('\n');
    }
    text
}

pub fn print_flagged(flagged: &[String]) {
    print!("{}", render_flagged(flagged));
}
