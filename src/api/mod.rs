//! Typed request and response payloads for the remote API.
//!
//! Responses are decoded into small structs with optional fields so that a
//! missing key is a value we can inspect rather than a decode failure; requests
//! are explicit structs validated before submission.

mod character;
mod export;
mod search;

pub use character::{PrimaryCharacter, ProductDetails};
pub use export::{
    ExportKind, ExportRequest, GmsHash, JobStatusResponse, MotionPreferences, PosePreferences,
    RemoteJobStatus, EXPORT_FORMAT,
};
pub use search::{Pagination, SearchPage, SearchParams, DEFAULT_PAGE_SIZE, MOTION_TYPE};

/// Endpoint paths, relative to the configured base URL.
pub mod paths {
    /// Paginated, query-filtered product search.
    pub const PRODUCTS: &str = "api/v1/products";
    /// The acting user's primary character.
    pub const PRIMARY_CHARACTER: &str = "api/v1/characters/primary";
    /// Export job submission.
    pub const EXPORT: &str = "api/v1/animations/export";

    /// Product detail for one catalog item.
    #[must_use]
    pub fn product(product_id: &str) -> String {
        format!("{PRODUCTS}/{product_id}")
    }

    /// Export job monitor for one character.
    #[must_use]
    pub fn monitor(character_id: &str) -> String {
        format!("api/v1/characters/{character_id}/monitor")
    }
}
