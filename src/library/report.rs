//! Scan report types for folder-to-library builds.
//!
//! A folder scan never aborts on a single bad document. Every skipped file
//! is recorded here with the same severity it was logged at.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// The outcome of scanning one folder into a library.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ScanReport {
    /// Library name (folder base name).
    pub library: String,
    /// Documents matched by the glob.
    pub scanned: usize,
    /// Icons added to the library.
    pub icons: usize,
    /// Documents that were skipped, and why.
    pub issues: Vec<ScanIssue>,
}

impl ScanReport {
    pub fn new(library: impl Into<String>) -> Self {
        Self {
            library: library.into(),
            ..Default::default()
        }
    }

    pub fn add(&mut self, issue: ScanIssue) {
        self.issues.push(issue);
    }

    /// Count of documents skipped because they are not icons.
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == ScanSeverity::Warning)
            .count()
    }

    /// Count of documents skipped because of a real failure.
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == ScanSeverity::Error)
            .count()
    }
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Library '{}': {} icon(s) from {} document(s)",
            self.library, self.icons, self.scanned
        )?;

        for (severity, heading) in [
            (ScanSeverity::Error, "Errors"),
            (ScanSeverity::Warning, "Skipped"),
        ] {
            let matching: Vec<&ScanIssue> = self
                .issues
                .iter()
                .filter(|i| i.severity == severity)
                .collect();
            if matching.is_empty() {
                continue;
            }
            writeln!(f)?;
            writeln!(f, "{} ({}):", heading, matching.len())?;
            for issue in matching {
                writeln!(f, "  - {}: {}", issue.path.display(), issue.message)?;
            }
        }

        Ok(())
    }
}

/// A single skipped document.
#[derive(Clone, Debug, Serialize)]
pub struct ScanIssue {
    pub severity: ScanSeverity,
    pub code: ScanIssueCode,
    pub path: PathBuf,
    pub message: String,
}

impl ScanIssue {
    pub fn warning(code: ScanIssueCode, path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            severity: ScanSeverity::Warning,
            code,
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn error(code: ScanIssueCode, path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            severity: ScanSeverity::Error,
            code,
            path: path.into(),
            message: message.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanSeverity {
    /// The document is not an icon; expected in mixed folders.
    Warning,
    /// The document could not be turned into an icon.
    Error,
}

/// Stable issue codes for programmatic consumption.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanIssueCode {
    /// No tooltip sections and no image.
    NotAnIcon,
    /// The document or its image could not be read.
    ReadFailed,
    /// Directory traversal failed for an entry.
    TraversalFailed,
}
