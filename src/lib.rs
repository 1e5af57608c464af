//! Mixamo Downloader Core Library
//!
//! This library enumerates a remote motion catalog through a paginated,
//! query-filtered search API and converts each catalog entry into a
//! downloaded artifact through an asynchronous export job API.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`gateway`] - Shared HTTP client, fixed header set, request pacing
//! - [`api`] - Typed request and response payloads, endpoint paths
//! - [`catalog`] - Partitioned enumeration, deduplication, duplicate reports
//! - [`export`] - Export job state machine and submit/poll orchestration
//! - [`download`] - Resumable artifact persistence and filename safety
//! - [`run`] - Sequential export runs, cancellation, progress observers

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod catalog;
pub mod download;
pub mod export;
pub mod gateway;
pub mod run;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use catalog::{Catalog, CatalogCollector, CatalogItem, CollectorConfig, StopReason};
pub use download::{DownloadResumer, sanitize_filename};
pub use export::{ExportConfig, ExportJob, ExportOrchestrator, JobState};
pub use gateway::{ApiClient, ApiError, GatewayConfig};
pub use run::{Character, ExportRunner, ProgressObserver, RunSummary, resolve_primary_character};
