//! Search endpoint payloads.

use serde::Deserialize;
use serde_json::Value;

/// Type filter restricting search results to single-clip motions (no packs).
pub const MOTION_TYPE: &str = "Motion";

/// Page size the web client uses.
pub const DEFAULT_PAGE_SIZE: u32 = 96;

/// Query parameters of one search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams<'a> {
    /// 1-based page number.
    pub page: u32,
    /// Results per page.
    pub limit: u32,
    /// Query fragment (may be empty).
    pub query: &'a str,
}

impl SearchParams<'_> {
    /// Renders the parameters as query pairs, including the fixed type filter.
    #[must_use]
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
            ("order", String::new()),
            ("type", MOTION_TYPE.to_string()),
            ("query", self.query.to_string()),
        ]
    }
}

/// One page of search results.
///
/// Records are kept as raw JSON: the catalog stores every field verbatim so
/// divergent duplicates can be diffed field by field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchPage {
    /// Raw result records.
    #[serde(default)]
    pub results: Vec<Value>,
    /// Pagination block.
    #[serde(default)]
    pub pagination: Pagination,
}

/// Server-reported pagination counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Pagination {
    /// Number of pages for this query.
    #[serde(default)]
    pub num_pages: u32,
    /// Number of results for this query.
    #[serde(default)]
    pub num_results: u64,
}
