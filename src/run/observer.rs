//! Progress and per-item result notifications.

use std::path::PathBuf;

use thiserror::Error;

use crate::download::DownloadError;
use crate::export::{JobFailure, PayloadError};

/// Why an item produced no artifact.
#[derive(Debug, Error)]
pub enum ItemFailure {
    /// The export payload could not be built.
    #[error("cannot build export payload: {source}")]
    Payload {
        /// The payload error.
        #[source]
        source: PayloadError,
    },

    /// The export job ended in Failed.
    #[error("{failure}")]
    Export {
        /// Failure cause reported by the job.
        failure: JobFailure,
    },

    /// The export job ran out of poll budget (or its submission timed out).
    #[error("export timed out after {polls} polls")]
    TimedOut {
        /// Poll cycles consumed.
        polls: u32,
    },

    /// The artifact could not be written.
    #[error("cannot save artifact: {source}")]
    Download {
        /// The download error.
        #[source]
        source: DownloadError,
    },
}

/// Result of processing one item.
#[derive(Debug)]
pub enum ItemOutcome {
    /// An artifact already existed; no network activity.
    Skipped {
        /// The existing artifact.
        path: PathBuf,
    },
    /// The artifact was exported and saved.
    Succeeded {
        /// The new artifact.
        path: PathBuf,
        /// Artifact size.
        bytes: u64,
    },
    /// The item failed; the run continues.
    Failed {
        /// The cause.
        reason: ItemFailure,
    },
}

impl ItemOutcome {
    /// Returns true if processing the item touched the network.
    #[must_use]
    pub fn was_attempted(&self) -> bool {
        !matches!(self, Self::Skipped { .. })
    }
}

/// Receives run progress; implemented by presentation layers.
///
/// Every method has an empty default so observers implement only what they
/// render. Calls happen on the runner's task, between items.
pub trait ProgressObserver: Send + Sync {
    /// Number of items the run will consider.
    fn on_total(&self, _total: usize) {}

    /// `completed` of `total` items have been handled (skipped items count).
    fn on_progress(&self, _completed: usize, _total: usize) {}

    /// Result of one item.
    fn on_item_result(&self, _item_id: &str, _outcome: &ItemOutcome) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {}
