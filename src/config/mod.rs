//! Configuration module for Leafwalk
//!
//! Settings come from an optional TOML file, are overridden by command-line
//! flags, and are validated once both have been merged.
//!
//! # Example
//!
//! ```no_run
//! use leafwalk::config::{finalize, load_config};
//! use std::path::Path;
//!
//! let mut config = load_config(Path::new("leafwalk.toml")).unwrap();
//! config.crawl.max_categories_per_page = 3;
//! let config = finalize(config).unwrap();
//! println!("Walking from {:?}", config.target_url());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlConfig, FetchConfig, LogConfig, OutputConfig, ProductsConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, finalize, load_config, load_config_with_hash, parse_config};
pub use validation::{validate, LOG_LEVELS, MAX_CACHE_AGE_SECS};
