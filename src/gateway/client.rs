//! Capability-scoped HTTP client for the catalog and export APIs.
//!
//! [`ApiClient`] owns the one connection pool of the process. API requests carry
//! the fixed header set (API key, bearer token, JSON accept) and are paced;
//! artifact downloads go to pre-signed result URLs and are sent bare.

use std::sync::Arc;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderName, HeaderValue, ORIGIN, REFERER};
use reqwest::{Client, Proxy, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::config::GatewayConfig;
use super::error::ApiError;
use super::pacer::RequestPacer;

/// Browser User-Agent; the API rejects obvious non-browser agents.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

const API_KEY_HEADER: &str = "x-api-key";
const REQUESTED_WITH_HEADER: &str = "x-requested-with";

/// HTTP client shared by every component.
///
/// Build it once with [`ApiClient::new`] and pass it by reference; clones share
/// the same pool and pacer.
///
/// # Example
///
/// ```no_run
/// use mixamo_core::gateway::{ApiClient, GatewayConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ApiClient::new(&GatewayConfig::default().with_access_token("token"))?;
/// let response = client.get("api/v1/characters/primary", &[]).await?;
/// println!("status: {}", response.status());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    api_headers: HeaderMap,
    pacer: Arc<RequestPacer>,
}

impl ApiClient {
    /// Builds the client from an immutable configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidConfig`] when the base URL, proxy, token, or
    /// API key cannot be used, or when the TLS backend fails to initialize.
    #[instrument(level = "debug", skip(config), fields(base_url = %config.base_url))]
    pub fn new(config: &GatewayConfig) -> Result<Self, ApiError> {
        let base_url = normalize_base_url(&config.base_url)?;
        let api_headers = build_api_headers(config, &base_url)?;

        let mut builder = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .gzip(true)
            .user_agent(BROWSER_USER_AGENT);
        if let Some(proxy) = config.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            let resolved = Proxy::all(proxy.trim())
                .map_err(|e| ApiError::invalid_config("proxy", e.to_string()))?;
            debug!(proxy = %proxy, "routing requests through proxy");
            builder = builder.proxy(resolved);
        }
        let client = builder
            .build()
            .map_err(|e| ApiError::invalid_config("client", e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            api_headers,
            pacer: Arc::new(RequestPacer::new(config.min_request_interval)),
        })
    }

    /// Returns the normalized base URL (always ends with `/`).
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the shared request pacer.
    #[must_use]
    pub fn pacer(&self) -> &RequestPacer {
        &self.pacer
    }

    /// Resolves an API path plus query pairs against the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] if the path cannot be joined.
    pub fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ApiError> {
        let mut url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|_| ApiError::invalid_url(path))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Issues a GET against an API path and returns the response whatever its status.
    ///
    /// # Errors
    ///
    /// Returns a transport error (network/timeout) or [`ApiError::InvalidUrl`].
    #[instrument(level = "debug", skip(self, query))]
    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Response, ApiError> {
        let url = self.endpoint(path, query)?;
        let request = self.client.get(url.clone()).headers(self.api_headers.clone());
        self.send(request, &url).await
    }

    /// Issues a GET against an API path and decodes a successful JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::HttpStatus`] for non-success statuses and
    /// [`ApiError::Decode`] for malformed bodies, besides transport errors.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let response = self.get(path, query).await?;
        decode_json(response).await
    }

    /// Issues a JSON POST against an API path and returns the response whatever its status.
    ///
    /// # Errors
    ///
    /// Returns a transport error (network/timeout) or [`ApiError::InvalidUrl`].
    #[instrument(level = "debug", skip(self, body))]
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, ApiError> {
        let url = self.endpoint(path, &[])?;
        let request = self
            .client
            .post(url.clone())
            .headers(self.api_headers.clone())
            .json(body);
        self.send(request, &url).await
    }

    /// Fetches a result URL without API headers; only success statuses pass.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`], a transport error, or
    /// [`ApiError::HttpStatus`] for non-success statuses.
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch_artifact(&self, url: &str) -> Result<Response, ApiError> {
        let parsed = Url::parse(url).map_err(|_| ApiError::invalid_url(url))?;
        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| ApiError::transport(url, e))?;
        if !response.status().is_success() {
            return Err(ApiError::http_status(url, response.status().as_u16()));
        }
        Ok(response)
    }

    async fn send(&self, request: RequestBuilder, url: &Url) -> Result<Response, ApiError> {
        self.pacer.acquire().await;
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::transport(url.as_str(), e))?;
        debug!(url = %url, status = response.status().as_u16(), "API response");
        Ok(response)
    }
}

/// Decodes a JSON body, rejecting non-success statuses first.
///
/// # Errors
///
/// Returns [`ApiError::HttpStatus`] or [`ApiError::Decode`].
pub async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let url = response.url().to_string();
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::http_status(url, status.as_u16()));
    }
    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::decode(url, e))
}

fn normalize_base_url(raw: &str) -> Result<Url, ApiError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&with_slash)
        .map_err(|e| ApiError::invalid_config("base_url", format!("{raw}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::invalid_config(
            "base_url",
            format!("unsupported scheme `{}`", url.scheme()),
        ));
    }
    Ok(url)
}

fn build_api_headers(config: &GatewayConfig, base_url: &Url) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(
        HeaderName::from_static(REQUESTED_WITH_HEADER),
        HeaderValue::from_static("XMLHttpRequest"),
    );
    headers.insert(
        HeaderName::from_static(API_KEY_HEADER),
        HeaderValue::from_str(&config.api_key)
            .map_err(|e| ApiError::invalid_config("api_key", e.to_string()))?,
    );

    let origin = base_url.origin().ascii_serialization();
    if let Ok(value) = HeaderValue::from_str(&origin) {
        headers.insert(ORIGIN, value);
    }
    if let Ok(value) = HeaderValue::from_str(base_url.as_str()) {
        headers.insert(REFERER, value);
    }

    if let Some(token) = config.access_token.as_deref().filter(|t| !t.is_empty()) {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| ApiError::invalid_config("access_token", e.to_string()))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}
