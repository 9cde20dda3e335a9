//! Leafwalk main entry point
//!
//! This is the command-line interface for the Leafwalk catalog crawler.

use anyhow::Context;
use clap::Parser;
use leafwalk::config::{finalize, load_config_with_hash, Config};
use leafwalk::{run_category_pass, run_product_pass};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Leafwalk: a resumable catalog crawler
///
/// Leafwalk walks a catalog's category tree from a root category page,
/// checkpoints every leaf category it finds, and then scrapes the products
/// listed on each leaf into a JSON Lines file. Both passes retry when the
/// connection stalls, and the product pass resumes where it stopped.
#[derive(Parser, Debug)]
#[command(name = "leafwalk")]
#[command(version = "1.0.0")]
#[command(about = "A resumable catalog crawler", long_about = None)]
struct Cli {
    /// Root category page to start from
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Path to TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Product output file (JSON Lines)
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Leaf category checkpoint file
    #[arg(long, value_name = "FILE")]
    categories_file: Option<PathBuf>,

    /// Maximum attempts for the category pass
    #[arg(long, value_name = "N")]
    retries_categories: Option<u32>,

    /// Maximum attempts for the product pass
    #[arg(long, value_name = "N")]
    retries_products: Option<u32>,

    /// Child categories to follow per navigation layout on a page
    #[arg(long, value_name = "N")]
    max_categories: Option<usize>,

    /// Product links to follow per link markup on a listing page
    #[arg(long, value_name = "N")]
    max_products: Option<usize>,

    /// Reuse an existing checkpoint file and only scrape products
    #[arg(long)]
    skip_category_scraping: bool,

    /// Log level (debug, info, warn, error)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Response cache directory
    #[arg(long, value_name = "DIR", conflicts_with = "no_cache")]
    cache_dir: Option<PathBuf>,

    /// Disable the response cache
    #[arg(long)]
    no_cache: bool,

    /// Delay between requests to the target site, in milliseconds
    #[arg(long, value_name = "MS")]
    delay: Option<u64>,

    /// Extra random delay between requests, in milliseconds
    #[arg(long, value_name = "MS")]
    random_delay: Option<u64>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Maximum number of requests in flight
    #[arg(long, value_name = "N")]
    parallelism: Option<usize>,

    /// Never write the same leaf category twice
    #[arg(long)]
    dedupe_leaves: bool,

    /// Validate the configuration, print it, and exit without crawling
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration
    fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.url {
            config.crawl.target_url = Some(url.clone());
        }
        if let Some(path) = &self.output {
            config.output.output_file = path.clone();
        }
        if let Some(path) = &self.categories_file {
            config.output.categories_file = path.clone();
        }
        if let Some(n) = self.retries_categories {
            config.crawl.max_retries = n;
        }
        if let Some(n) = self.retries_products {
            config.products.max_retries = n;
        }
        if let Some(n) = self.max_categories {
            config.crawl.max_categories_per_page = n;
        }
        if let Some(n) = self.max_products {
            config.products.max_products_per_page = n;
        }
        if self.skip_category_scraping {
            config.crawl.skip = true;
        }
        if self.dedupe_leaves {
            config.crawl.dedupe_leaves = true;
        }
        if let Some(level) = &self.log_level {
            config.log.level = level.clone();
        }
        if let Some(dir) = &self.cache_dir {
            config.fetch.cache_dir = Some(dir.clone());
        }
        if self.no_cache {
            config.fetch.cache_dir = None;
        }
        if let Some(ms) = self.delay {
            config.fetch.delay_ms = ms;
        }
        if let Some(ms) = self.random_delay {
            config.fetch.random_delay_ms = ms;
        }
        if let Some(secs) = self.timeout {
            config.fetch.timeout_secs = secs;
        }
        if let Some(n) = self.parallelism {
            config.fetch.parallelism = n;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let (config, config_hash) = match load(&cli) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    setup_logging(&config.log.level);

    if let (Some(path), Some(hash)) = (&cli.config, &config_hash) {
        tracing::info!("Configuration loaded from {} (hash: {})", path.display(), hash);
    }

    if cli.dry_run {
        print_dry_run(&config);
        return ExitCode::SUCCESS;
    }

    match run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Loads the configuration file (if any), applies CLI overrides and validates
fn load(cli: &Cli) -> anyhow::Result<(Config, Option<String>)> {
    let (mut config, hash) = match &cli.config {
        Some(path) => {
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };

    cli.apply(&mut config);
    let config = finalize(config).context("Invalid configuration")?;
    Ok((config, hash))
}

/// Sets up the logging/tracing subscriber for the configured level
///
/// `RUST_LOG` takes precedence when set.
fn setup_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("leafwalk={},warn", level.to_lowercase())));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Runs the category pass (unless skipped) and then the product pass
async fn run(config: &Config) -> anyhow::Result<()> {
    if config.crawl.skip {
        tracing::info!(
            checkpoint = %config.output.categories_file.display(),
            "Skipping category scraping"
        );
    } else {
        let report = run_category_pass(config)
            .await
            .context("Category pass could not start")?;
        if !report.is_success() {
            tracing::warn!(
                attempts = report.attempts(),
                "Category pass did not complete; scraping products from the leaves found so far"
            );
        }
    }

    let summary = run_product_pass(config)
        .await
        .context("Product pass could not start")?;

    tracing::info!(
        products = summary.products,
        listings = summary.counters.dispatched,
        failed = summary.counters.failed,
        output = %config.output.output_file.display(),
        "Done"
    );
    Ok(())
}

/// Handles the --dry-run mode: shows the resolved configuration
fn print_dry_run(config: &Config) {
    println!("=== Leafwalk Dry Run ===\n");

    println!("Target: {}", config.target_url().unwrap_or_default());

    println!("\nCategory pass:");
    println!("  Skipped: {}", config.crawl.skip);
    println!("  Max attempts: {}", config.crawl.max_retries);
    println!("  Max categories per layout: {}", config.crawl.max_categories_per_page);
    println!("  Dedupe leaves: {}", config.crawl.dedupe_leaves);

    println!("\nProduct pass:");
    println!("  Max attempts: {}", config.products.max_retries);
    println!("  Max products per markup: {}", config.products.max_products_per_page);

    println!("\nFetch:");
    match &config.fetch.cache_dir {
        Some(dir) => println!("  Cache: {}", dir.display()),
        None => println!("  Cache: disabled"),
    }
    println!(
        "  Delay: {}ms (+ up to {}ms) for {}",
        config.fetch.delay_ms, config.fetch.random_delay_ms, config.fetch.domain_glob
    );
    println!("  Timeout: {}s", config.fetch.timeout_secs);
    println!("  Parallelism: {}", config.fetch.parallelism);

    println!("\nOutput:");
    println!("  Checkpoint: {}", config.output.categories_file.display());
    println!("  Products: {}", config.output.output_file.display());

    println!("\n✓ Configuration is valid");
}
