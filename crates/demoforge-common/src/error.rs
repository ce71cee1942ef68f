//! Common error types used throughout demoforge.
//!
//! Covers the failure cases shared by every pipeline stage: I/O on manifests
//! and videos, JSON encoding, and invalid caller input.

use std::path::PathBuf;

/// Common error type for demoforge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required file or directory was not found.
    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Create a new NotFound error.
    pub fn not_found<P: Into<PathBuf>>(path: P) -> Self {
        Self::NotFound(path.into())
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
