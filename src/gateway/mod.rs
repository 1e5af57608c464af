//! HTTP gateway: the only path by which the crate talks to the network.
//!
//! # Features
//!
//! - One connection pool, configured once from an immutable [`GatewayConfig`]
//! - Fixed API header set (API key, bearer token, JSON accept, origin/referer)
//! - Optional upstream proxy and per-request timeout
//! - Minimum spacing between API requests and a shared rate-limit backoff tally

mod client;
mod config;
mod error;
mod pacer;

pub use client::{ApiClient, BROWSER_USER_AGENT, decode_json};
pub use config::{
    CONNECT_TIMEOUT_SECS, DEFAULT_API_KEY, DEFAULT_BASE_URL, GatewayConfig, REQUEST_TIMEOUT_SECS,
};
pub use error::ApiError;
pub use pacer::RequestPacer;
