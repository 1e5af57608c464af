//! Export jobs: payload construction, submission, and bounded polling.
//!
//! # Example
//!
//! ```no_run
//! use mixamo_core::catalog::CatalogItem;
//! use mixamo_core::export::{ExportConfig, ExportOrchestrator, JobState};
//! use mixamo_core::gateway::{ApiClient, GatewayConfig};
//!
//! # async fn example(item: CatalogItem) -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::new(&GatewayConfig::default().with_access_token("token"))?;
//! let orchestrator = ExportOrchestrator::new(client, ExportConfig::default());
//! let payload = orchestrator.prepare("character-id", &item).await?;
//! let job = orchestrator.run("character-id", &item.id, payload).await;
//! if job.state() == JobState::Completed {
//!     println!("result at {:?}", job.result_location());
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod job;
mod orchestrator;
mod payload;

pub use config::{
    DEFAULT_ITEM_DELAY, DEFAULT_POLL_BUDGET, DEFAULT_RATE_LIMIT_BACKOFF, ExportConfig,
    MIN_POLL_INTERVAL,
};
pub use job::{ExportJob, InvalidTransition, JobFailure, JobState};
pub use orchestrator::ExportOrchestrator;
pub use payload::{DEFAULT_TRIM, PayloadError, normalize_hash_block};
