//! Export runs: identity resolution, the sequential item loop, cancellation,
//! and progress reporting.

mod identity;
mod observer;
mod runner;

pub use identity::{Character, RunError, resolve_primary_character};
pub use observer::{ItemFailure, ItemOutcome, NoopObserver, ProgressObserver};
pub use runner::{ExportRunner, RunSummary};
