use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Leafwalk
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawl: CrawlConfig,
    pub products: ProductsConfig,
    pub fetch: FetchConfig,
    pub output: OutputConfig,
    pub log: LogConfig,
}

impl Config {
    /// The root category URL, if one has been configured
    pub fn target_url(&self) -> Option<&str> {
        self.crawl.target_url.as_deref()
    }
}

/// Category discovery pass configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Root category page the traversal starts from
    #[serde(rename = "target-url")]
    pub target_url: Option<String>,

    /// Maximum number of traversal attempts
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Fan-out cap per navigation layout on a branch page
    #[serde(rename = "max-categories-per-page")]
    pub max_categories_per_page: usize,

    /// Skip discovery and reuse an existing categories file
    #[serde(rename = "skip")]
    pub skip: bool,

    /// Never write the same leaf URL twice within one run
    #[serde(rename = "dedupe-leaves")]
    pub dedupe_leaves: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            target_url: None,
            max_retries: 3,
            max_categories_per_page: 5,
            skip: false,
            dedupe_leaves: false,
        }
    }
}

/// Product extraction pass configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProductsConfig {
    /// Maximum number of passes over the categories file
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Maximum number of product links followed per listing selector
    #[serde(rename = "max-products-per-page")]
    pub max_products_per_page: usize,
}

impl Default for ProductsConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            max_products_per_page: 20,
        }
    }
}

/// Fetch engine configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Directory for the on-disk response cache (None disables caching)
    #[serde(rename = "cache-dir")]
    pub cache_dir: Option<PathBuf>,

    /// Cached responses older than this are refetched (seconds)
    #[serde(rename = "cache-max-age")]
    pub cache_max_age: Option<u64>,

    /// Hosts the rate limit applies to (e.g. "*.ebay.com")
    #[serde(rename = "domain-glob")]
    pub domain_glob: String,

    /// Minimum time between request starts to matching hosts (milliseconds)
    #[serde(rename = "delay")]
    pub delay_ms: u64,

    /// Upper bound of the random extra delay (milliseconds)
    #[serde(rename = "random-delay")]
    pub random_delay_ms: u64,

    /// Whole-request timeout (seconds)
    #[serde(rename = "timeout")]
    pub timeout_secs: u64,

    /// Connection timeout (seconds)
    #[serde(rename = "connect-timeout")]
    pub connect_timeout_secs: u64,

    /// Maximum number of requests in flight
    #[serde(rename = "parallelism")]
    pub parallelism: usize,
}

impl FetchConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn random_delay(&self) -> Duration {
        Duration::from_millis(self.random_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            cache_dir: Some(PathBuf::from("./cache")),
            cache_max_age: None,
            domain_glob: "*.ebay.com".to_string(),
            delay_ms: 2000,
            random_delay_ms: 1000,
            timeout_secs: 30,
            connect_timeout_secs: 10,
            parallelism: 4,
        }
    }
}

/// Output file configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// JSON Lines file receiving product records
    #[serde(rename = "output-file")]
    pub output_file: PathBuf,

    /// Checkpoint file of leaf category URLs
    #[serde(rename = "categories-file")]
    pub categories_file: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_file: PathBuf::from("output/scraped_data.jsonl"),
            categories_file: PathBuf::from("leaf_categories.txt"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// One of debug, info, warn, error
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "debug".to_string(),
        }
    }
}
