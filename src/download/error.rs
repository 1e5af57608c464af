//! Error types for the download module.
//!
//! Every variant is a per-item failure: the runner logs it and moves on to the
//! next item.

use std::path::PathBuf;

use thiserror::Error;

use crate::gateway::ApiError;

/// Errors that can occur while materializing an export artifact.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The result URL could not be requested or answered with a non-success status.
    #[error("artifact request failed: {source}")]
    Fetch {
        /// The underlying gateway error.
        #[source]
        source: ApiError,
    },

    /// The body stream broke off mid-transfer.
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The artifact URL.
        url: String,
        /// The underlying stream error.
        #[source]
        source: reqwest::Error,
    },

    /// The body stream stalled past the request timeout.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The artifact URL.
        url: String,
    },

    /// File system error while writing the artifact.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The server sent a zero-length artifact.
    #[error("empty artifact body from {url}")]
    EmptyBody {
        /// The artifact URL.
        url: String,
    },
}

impl DownloadError {
    /// Wraps a gateway error raised before the body started streaming.
    pub fn fetch(source: ApiError) -> Self {
        Self::Fetch { source }
    }

    /// Classifies a mid-stream error into a timeout or network error.
    pub fn stream(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::Timeout { url }
        } else {
            Self::Network { url, source }
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an empty body error.
    pub fn empty_body(url: impl Into<String>) -> Self {
        Self::EmptyBody { url: url.into() }
    }

    /// Returns true when the transfer timed out, before or during streaming.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Fetch { source } => source.is_timeout(),
            _ => false,
        }
    }
}
