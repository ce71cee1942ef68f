//! Error types for demoforge-episodes.
//!
//! Schema errors are fatal: the dataset cannot be used by the pipeline and
//! must be fixed upstream. Data-quality problems are never errors; they are
//! returned as [`IssueTag`](crate::IssueTag) lists.

use std::path::PathBuf;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading episodes.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The dataset has no top-level `episodes` container.
    #[error("unsupported schema: expected top-level 'episodes' group")]
    MissingEpisodesGroup,

    /// The `episodes` container is empty.
    #[error("dataset has zero episodes")]
    NoEpisodes,

    /// An episode lacks one or more required field paths.
    #[error("episode '{episode_key}' missing required paths: {missing:?}")]
    MissingPaths {
        episode_key: String,
        missing: Vec<String>,
    },

    /// A single path could not be resolved.
    #[error("missing path: {0}")]
    MissingPath(String),

    /// A path resolved to the wrong kind of node.
    #[error("'{path}' is not {expected}")]
    WrongKind {
        path: String,
        expected: &'static str,
    },

    /// An array has a shape the reader cannot work with.
    #[error("invalid shape for '{path}': {message}")]
    InvalidShape { path: String, message: String },

    /// A string field could not be decoded.
    #[error("invalid string at '{path}': {message}")]
    InvalidString { path: String, message: String },

    /// A numeric scalar field could not be decoded.
    #[error("invalid scalar at '{path}': {message}")]
    InvalidScalar { path: String, message: String },

    /// The dataset file does not exist.
    #[error("dataset not found: {}", .0.display())]
    NotFound(PathBuf),

    /// No backend can read this file.
    #[error("unsupported dataset format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// A JSON snapshot or key map could not be parsed.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure in shared helpers (key map persistence).
    #[error(transparent)]
    Common(#[from] demoforge_common::Error),

    /// libhdf5 reported an error.
    #[cfg(feature = "hdf5")]
    #[error("HDF5 error: {0}")]
    Hdf5(String),
}

impl Error {
    /// Create a wrong-kind error.
    pub fn wrong_kind(path: impl Into<String>, expected: &'static str) -> Self {
        Self::WrongKind {
            path: path.into(),
            expected,
        }
    }

    /// Create an invalid shape error.
    pub fn invalid_shape(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidShape {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid string error.
    pub fn invalid_string(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidString {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid scalar error.
    pub fn invalid_scalar(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidScalar {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether this error means the dataset does not follow the episode schema.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            Self::MissingEpisodesGroup
                | Self::NoEpisodes
                | Self::MissingPaths { .. }
                | Self::MissingPath(_)
                | Self::WrongKind { .. }
        )
    }
}

#[cfg(feature = "hdf5")]
impl From<hdf5::Error> for Error {
    fn from(err: hdf5::Error) -> Self {
        Error::Hdf5(err.to_string())
    }
}
