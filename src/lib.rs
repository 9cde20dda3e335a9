//! Leafwalk: a resumable catalog crawler
//!
//! This crate discovers leaf product-category pages by walking a catalog's
//! category tree, checkpoints their URLs to a line-oriented file, and then
//! visits every checkpointed page to extract product records as JSON Lines.
//! Both passes run under a bounded retry loop that tells a stalled network
//! apart from a page that simply has nothing to offer.

pub mod config;
pub mod crawler;
pub mod fetch;
pub mod output;
pub mod products;
pub mod url;

use thiserror::Error;

/// Main error type for Leafwalk operations
#[derive(Debug, Error)]
pub enum LeafwalkError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Crawl error: {0}")]
    Crawl(#[from] CrawlError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Missing required setting: {0}")]
    Missing(&'static str),
}

/// Failure of a single HTTP fetch
///
/// Every variant maps onto a status code. Zero means no HTTP status was ever
/// received (timeout, DNS failure, refused connection, broken body), which the
/// crawl drivers treat as a stall.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Reading body of {url} failed: {message}")]
    Body { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },
}

impl FetchError {
    /// The HTTP status code of the failed response, or 0 if none was received
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Transport { .. } | Self::Body { .. } => 0,
            Self::Status { status, .. } => *status,
        }
    }

    /// Returns true for connection-level failures
    pub fn is_stall(&self) -> bool {
        self.status_code() == 0
    }

    /// The URL the failed request was sent to
    pub fn url(&self) -> &str {
        match self {
            Self::Transport { url, .. } | Self::Body { url, .. } | Self::Status { url, .. } => url,
        }
    }
}

/// Errors returned by `Collector::visit` and `VisitQueue::visit`
#[derive(Debug, Clone, Error)]
pub enum VisitError {
    #[error("Missing URL")]
    MissingUrl,

    #[error("Invalid URL '{href}': {reason}")]
    InvalidUrl { href: String, reason: String },

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("URL already visited: {0}")]
    AlreadyVisited(String),

    #[error("Maximum depth {0} reached")]
    MaxDepth(u32),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Fetch engine stopped before finishing the visit")]
    Aborted,
}

/// Outcome of a traversal attempt or of a single product-pass line
///
/// `Stalled` is the only recoverable variant; everything else ends the
/// enclosing retry loop.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Connection stalled while fetching {url}")]
    Stalled { url: String },

    #[error("Visit failed: {0}")]
    Visit(#[from] VisitError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CrawlError {
    /// Returns true if retrying the attempt may succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Stalled { .. })
    }
}

/// Result type alias for Leafwalk operations
pub type Result<T> = std::result::Result<T, LeafwalkError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_category_pass, RetryReport};
pub use products::{run_product_pass, ProductPassSummary};
