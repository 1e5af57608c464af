//! Error types for catalog persistence.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or writing catalog snapshots and reports.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// File system error on a snapshot or report file.
    #[error("IO error on {path}: {source}")]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// JSON encoding or decoding failed.
    #[error("invalid catalog JSON in {path}: {source}")]
    Json {
        /// The file being read or written.
        path: PathBuf,
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },

    /// A snapshot record has no usable identifier.
    #[error("catalog snapshot {path} has a record without an id at index {index}")]
    MissingId {
        /// The snapshot file.
        path: PathBuf,
        /// Position of the offending record.
        index: usize,
    },
}

impl CatalogError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a JSON error.
    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}
