//! Artifact persistence and resumability.
//!
//! # Features
//!
//! - Canonical, filesystem-safe artifact path per display name
//! - Completion markers: a non-empty artifact at its canonical path marks the
//!   item done for every later run
//! - Streaming writes to a temporary sibling, renamed into place on success
//!
//! # Example
//!
//! ```no_run
//! use mixamo_core::download::DownloadResumer;
//! use mixamo_core::gateway::{ApiClient, GatewayConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::new(&GatewayConfig::default())?;
//! let resumer = DownloadResumer::new("./downloads");
//! let path = resumer.canonical_path("Walking");
//! if resumer.existing_marker(&path).await.is_none() {
//!     resumer
//!         .materialize(&client, "https://example.com/result.fbx", &path)
//!         .await?;
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod filename;
mod resumer;

pub use error::DownloadError;
pub use filename::sanitize_filename;
pub use resumer::{ARTIFACT_EXTENSION, DownloadResumer};
