use std::path::PathBuf;
use thiserror::Error;

/// The main error type for a2dl operations.
#[derive(Debug, Error)]
pub enum A2dlError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    NotFound { path: PathBuf },

    /// The document carries neither tooltip sections nor an image.
    ///
    /// Batch callers skip the file instead of aborting.
    #[error("Not an icon: {path} has no variables and no image")]
    NotAnIcon { path: PathBuf },

    #[error("Failed to parse XML from {path}: {message}")]
    XmlParse { path: PathBuf, message: String },

    #[error("Failed to parse library from {path}: {message}")]
    LibraryParse { path: PathBuf, message: String },

    #[error("Failed to write library to {path}: {source}")]
    LibraryWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode compressed diagram payload in {path}: {message}")]
    CompressedPayload { path: PathBuf, message: String },

    #[error("Malformed node '{node}': {message}")]
    MalformedNode { node: String, message: String },

    #[error("Failed to write diagram to {path} (backup restored: {restored}): {source}")]
    WriteFailed {
        path: PathBuf,
        restored: bool,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid glob pattern '{pattern}': {message}")]
    InvalidGlob { pattern: String, message: String },

    #[error("Failed to parse config from {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Failed to parse relations from {path}: {message}")]
    RelationsParse { path: PathBuf, message: String },

    #[error("{0}")]
    Usage(String),
}

impl A2dlError {
    /// Returns true for the recoverable "document is not an icon" condition.
    pub fn is_not_an_icon(&self) -> bool {
        matches!(self, A2dlError::NotAnIcon { .. })
    }
}
