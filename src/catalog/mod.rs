//! Catalog enumeration, deduplication, and duplicate analysis.
//!
//! # Overview
//!
//! - [`QueryPartitioner`] slices the search space into 37 fixed query fragments
//! - [`CatalogCollector`] paginates each fragment and merges results into a
//!   [`Catalog`] keyed by identifier, keeping every occurrence for analysis
//! - [`TerminationPolicy`] stops enumeration once the server total is reached
//!   or partitions stop contributing new items
//! - [`FieldDiff`] / [`DuplicateObservation`] classify repeated identifiers as
//!   consistent or divergent; divergent ones are reported, never reconciled
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use mixamo_core::catalog::{CatalogCollector, CollectorConfig, write_enumeration_outputs};
//! use mixamo_core::gateway::{ApiClient, GatewayConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::new(&GatewayConfig::default().with_access_token("token"))?;
//! let collector = CatalogCollector::new(client, CollectorConfig::default());
//! let outcome = collector.collect(&CancellationToken::new()).await;
//! write_enumeration_outputs(&outcome, Path::new("./catalog")).await?;
//! # Ok(())
//! # }
//! ```

mod collector;
mod diff;
mod error;
mod item;
mod names;
mod partition;
mod report;
mod snapshot;
mod termination;

pub use collector::{
    CatalogCollector, CollectionOutcome, CollectionState, CollectorConfig, DEFAULT_PAGE_DELAY,
    PartitionFetch, PartitionStats,
};
pub use diff::{DuplicateClass, DuplicateObservation, FieldDiff, Occurrence, diff_snapshots};
pub use error::CatalogError;
pub use item::{Catalog, CatalogItem, record_id};
pub use names::{assign_artifact_names, disambiguate_names};
pub use partition::{CATCH_ALL_LABEL, QueryPartitioner};
pub use report::{
    DUPLICATES_FILE, DivergentDuplicate, DuplicateExample, EnumerationOutputs, PartitionEntry,
    SUMMARY_FILE, SummaryReport, divergent_duplicates, write_enumeration_outputs,
};
pub use snapshot::{
    CATALOG_FILE, load_catalog, load_existing_catalog, save_catalog, write_json_atomic,
};
pub use termination::{DEFAULT_STAGNATION_LIMIT, Decision, StopReason, TerminationPolicy};
