//! Update report for one diagram patch pass.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// What an update pass did to a diagram.
#[derive(Clone, Debug, Default, Serialize)]
pub struct UpdateReport {
    pub diagram: PathBuf,
    /// Names of the libraries applied, in order.
    pub libraries: Vec<String>,
    /// Icon-bearing nodes in the diagram.
    pub objects: usize,
    /// Node patches applied (a node matched by two libraries counts twice).
    pub matched: usize,
    /// Nodes whose fingerprint differs after the pass.
    pub changed: usize,
    /// Nodes that were skipped.
    pub issues: Vec<UpdateIssue>,
    /// Where the result was written, once committed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub written: Option<PathBuf>,
}

impl UpdateReport {
    pub fn add(&mut self, issue: UpdateIssue) {
        self.issues.push(issue);
    }
}

impl fmt::Display for UpdateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Diagram {}: {} object(s), {} patched, {} changed",
            self.diagram.display(),
            self.objects,
            self.matched,
            self.changed
        )?;
        if !self.libraries.is_empty() {
            writeln!(f, "  libraries: {}", self.libraries.join(", "))?;
        }
        if let Some(written) = &self.written {
            writeln!(f, "  written to {}", written.display())?;
        }
        if !self.issues.is_empty() {
            writeln!(f)?;
            writeln!(f, "Skipped nodes ({}):", self.issues.len())?;
            for issue in &self.issues {
                writeln!(f, "  - {} (id {}): {}", issue.name, issue.id, issue.message)?;
            }
        }
        Ok(())
    }
}

/// A node that could not be patched.
#[derive(Clone, Debug, Serialize)]
pub struct UpdateIssue {
    pub name: String,
    pub id: String,
    pub library: String,
    pub message: String,
}
