//! Immutable gateway configuration, built once at startup.

use std::fmt;
use std::time::Duration;

/// Default API origin.
pub const DEFAULT_BASE_URL: &str = "https://www.mixamo.com";

/// Value sent in the `X-Api-Key` header by the web client.
pub const DEFAULT_API_KEY: &str = "mixamo2";

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default per-request timeout (60 seconds, covers artifact downloads too).
pub const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Everything needed to build an [`ApiClient`](super::ApiClient).
///
/// The value is constructed once, handed to `ApiClient::new`, and never
/// mutated afterwards; components share the resulting client by reference.
#[derive(Clone)]
pub struct GatewayConfig {
    /// Origin all API paths are joined onto.
    pub base_url: String,
    /// Bearer token for the `Authorization` header, when authenticated.
    pub access_token: Option<String>,
    /// Value of the `X-Api-Key` header.
    pub api_key: String,
    /// Optional upstream proxy applied to every scheme.
    pub proxy: Option<String>,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Whole-request timeout.
    pub request_timeout: Duration,
    /// Minimum spacing between consecutive API requests (zero disables pacing).
    pub min_request_interval: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token: None,
            api_key: DEFAULT_API_KEY.to_string(),
            proxy: None,
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            min_request_interval: Duration::ZERO,
        }
    }
}

impl GatewayConfig {
    /// Creates a configuration targeting `base_url` with default settings.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Sets the bearer token.
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Routes all traffic through `proxy`.
    #[must_use]
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Overrides the whole-request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Overrides the minimum spacing between API requests.
    #[must_use]
    pub fn with_min_request_interval(mut self, interval: Duration) -> Self {
        self.min_request_interval = interval;
        self
    }
}

// The token must never reach logs through `{:?}`.
impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<redacted>"),
            )
            .field("api_key", &self.api_key)
            .field("proxy", &self.proxy)
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("min_request_interval", &self.min_request_interval)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_config_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api_key, "mixamo2");
        assert!(config.access_token.is_none());
        assert!(config.proxy.is_none());
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.min_request_interval, Duration::ZERO);
    }

    #[test]
    fn test_gateway_config_debug_redacts_token() {
        let config = GatewayConfig::default().with_access_token("super-secret-token");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret-token"), "token leaked: {rendered}");
        assert!(rendered.contains("<redacted>"));
    }
}
