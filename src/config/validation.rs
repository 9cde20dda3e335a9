use crate::config::types::{Config, CrawlConfig, FetchConfig, LogConfig, OutputConfig, ProductsConfig};
use crate::ConfigError;
use url::Url;

/// Log levels accepted by `[log] level` and `--log-level`
pub const LOG_LEVELS: &[&str] = &["debug", "info", "warn", "error"];

/// Largest accepted `cache-max-age`, in seconds (100 years)
pub const MAX_CACHE_AGE_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_config(&config.crawl)?;
    validate_products_config(&config.products)?;
    validate_fetch_config(&config.fetch)?;
    validate_output_config(&config.output)?;
    validate_log_config(&config.log)?;
    Ok(())
}

/// Validates the category pass configuration
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    let target = config
        .target_url
        .as_deref()
        .ok_or(ConfigError::Missing("target URL"))?;

    let url = Url::parse(target)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid target URL '{}': {}", target, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Target URL '{}' must use http or https",
            target
        )));
    }

    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "category max_retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    if config.max_categories_per_page < 1 {
        return Err(ConfigError::Validation(
            "max_categories_per_page must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates the product pass configuration
fn validate_products_config(config: &ProductsConfig) -> Result<(), ConfigError> {
    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "product max_retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    if config.max_products_per_page < 1 {
        return Err(ConfigError::Validation(
            "max_products_per_page must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates fetch engine configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.parallelism < 1 || config.parallelism > 64 {
        return Err(ConfigError::Validation(format!(
            "parallelism must be between 1 and 64, got {}",
            config.parallelism
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout must be at least 1 second".to_string(),
        ));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "connect_timeout must be at least 1 second".to_string(),
        ));
    }

    if let Some(secs) = config.cache_max_age {
        if secs > MAX_CACHE_AGE_SECS {
            return Err(ConfigError::Validation(format!(
                "cache_max_age must be at most {} seconds, got {}",
                MAX_CACHE_AGE_SECS, secs
            )));
        }
    }

    if config.domain_glob.is_empty() {
        return Err(ConfigError::Validation(
            "domain_glob cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.output_file.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output_file cannot be empty".to_string(),
        ));
    }

    if config.categories_file.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "categories_file cannot be empty".to_string(),
        ));
    }

    if config.output_file == config.categories_file {
        return Err(ConfigError::Validation(format!(
            "output_file and categories_file must differ, both are '{}'",
            config.output_file.display()
        )));
    }

    Ok(())
}

fn validate_log_config(config: &LogConfig) -> Result<(), ConfigError> {
    let level = config.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(ConfigError::Validation(format!(
            "invalid log level: {}",
            config.level
        )));
    }
    Ok(())
}
