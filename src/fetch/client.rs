//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the configured timeouts
//! - Rotating desktop user agents per request
//! - Serving and filling the on-disk response cache
//! - Classifying failures into transport, body and status errors

use crate::config::FetchConfig;
use crate::fetch::cache::ResponseCache;
use crate::FetchError;
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

/// Desktop browser user agents rotated across requests
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
];

/// Picks a user agent at random
pub fn random_user_agent() -> &'static str {
    USER_AGENTS[fastrand::usize(..USER_AGENTS.len())]
}

/// A successfully fetched page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Final URL after redirects
    pub url: String,

    /// HTTP status code
    pub status: u16,

    /// Content-Type header value
    pub content_type: String,

    /// Page body
    pub body: String,
}

impl Response {
    /// Builds a 200 text/html response, mostly useful for tests and fakes
    pub fn html(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: 200,
            content_type: "text/html; charset=utf-8".to_string(),
            body: body.into(),
        }
    }

    /// Returns true if the body should be handed to HTML handlers
    ///
    /// An absent Content-Type is treated as HTML.
    pub fn is_html(&self) -> bool {
        self.content_type.is_empty() || self.content_type.contains("html")
    }
}

/// Fetches single pages for the collector
///
/// Implementations must map connection-level failures (no HTTP status ever
/// received) to an error whose `status_code()` is 0.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Response, FetchError>;
}

/// Builds an HTTP client with the configured timeouts
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(config.timeout())
        .connect_timeout(config.connect_timeout())
        .gzip(true)
        .brotli(true)
        .build()
}

/// The production fetcher: reqwest plus an optional response cache
pub struct ReqwestFetcher {
    client: Client,
    cache: Option<ResponseCache>,
}

impl ReqwestFetcher {
    /// Creates a fetcher from the fetch configuration
    ///
    /// Caching is enabled when `cache_dir` is set.
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(config)?;
        let cache = config
            .cache_dir
            .as_ref()
            .map(|dir| ResponseCache::new(dir.clone(), config.cache_max_age));

        Ok(Self { client, cache })
    }

    async fn fetch_remote(&self, url: &Url) -> Result<Response, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .header(USER_AGENT, random_user_agent())
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: url.to_string(),
                message: describe_transport_error(&e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let body = response.text().await.map_err(|e| FetchError::Body {
            url: url.to_string(),
            message: describe_transport_error(&e),
        })?;

        Ok(Response {
            url: final_url,
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &Url) -> Result<Response, FetchError> {
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.load(url).await {
                tracing::debug!(url = %url, "Serving response from cache");
                return Ok(hit);
            }
        }

        let response = self.fetch_remote(url).await?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.store(url, &response).await {
                tracing::warn!(url = %url, "Failed to cache response: {}", e);
            }
        }

        Ok(response)
    }
}

fn describe_transport_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("request timeout ({})", error)
    } else if error.is_connect() {
        format!("connection failed ({})", error)
    } else {
        error.to_string()
    }
}
