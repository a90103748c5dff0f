//! Human-readable rendering of a [`Report`]

use crate::reconcile::Report;
use std::fmt;

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} packages were pulled.", self.pulled.len())?;
        for name in &self.pulled {
            writeln!(f, "\t{}", name)?;
        }
        writeln!(f)?;

        if self.pending.is_empty() {
            writeln!(f, "All installed packages are caught up with their sources.")?;
        } else {
            writeln!(f, "The following packages have newer sources than installed:")?;
            for update in &self.pending {
                writeln!(
                    f,
                    "\t{}: {} -> {}",
                    update.name(),
                    update.installed.version(),
                    update.available.version()
                )?;
            }
        }
        writeln!(f)?;

        if self.flagged.is_empty() {
            writeln!(f, "No rebuild issues detected.")
        } else {
            writeln!(f, "The following packages need a rebuild but received no update:")?;
            for name in &self.flagged {
                writeln!(f, "\t{}", name)?;
            }
            Ok(())
        }
    }
}

/// Render the three sections of a report as plain text
pub fn render(report: &Report) -> String {
    report.to_string()
}

/// Print the report to stdout and tell the caller whether the user has work to do
pub fn present(report: &Report) -> bool {
    print!("{}", render(report));
    report.action_needed
}
