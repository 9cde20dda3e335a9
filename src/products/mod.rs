//! The product pass
//!
//! This module handles:
//! - Reading the leaf checkpoint with a resumable byte cursor
//! - Following product links from listing pages
//! - Extracting product records from item pages
//! - Writing records as JSON Lines

mod cursor;
mod extract;
mod pass;

pub use cursor::{CheckpointLine, CheckpointReader, ReadCursor};
pub use extract::{
    extract_product, extract_products, product_links, ExtractError, Product, BROWSE_LINK,
    DETAIL_CONTAINER, ITEM_LINK,
};
pub use pass::{PassCounters, ProductHandler, ProductPass, ITEM_DEPTH};

use crate::config::Config;
use crate::crawler::{run_with_retries, RetryReport};
use crate::fetch::Collector;
use crate::output::JsonLinesWriter;
use crate::LeafwalkError;
use std::sync::Arc;

/// Result of a product pass
#[derive(Debug)]
pub struct ProductPassSummary {
    pub report: RetryReport,
    pub counters: PassCounters,
    /// Where the last attempt stopped
    pub cursor: ReadCursor,
    /// Product records written to the output file
    pub products: u64,
}

/// Runs the product pass described by `config`
///
/// The checkpoint file must exist. The output file is created (or
/// truncated) and synced before returning. Like the category pass, a pass
/// that exhausts its retries is still `Ok`.
pub async fn run_product_pass(config: &Config) -> Result<ProductPassSummary, LeafwalkError> {
    let collector = Collector::from_config(&config.fetch, Some(ITEM_DEPTH))?;
    product_pass(config, &collector).await
}

/// Like [`run_product_pass`] with a caller-supplied collector
///
/// `collector` should limit depth to [`ITEM_DEPTH`]. Every attempt runs on a
/// fork of it.
pub async fn product_pass(config: &Config, collector: &Collector) -> Result<ProductPassSummary, LeafwalkError> {
    let checkpoint = &config.output.categories_file;
    tokio::fs::metadata(checkpoint).await?;

    let writer = Arc::new(JsonLinesWriter::create(&config.output.output_file)?);
    let pass = ProductPass::new(checkpoint, config.products.max_products_per_page, Arc::clone(&writer));

    tracing::info!(
        checkpoint = %checkpoint.display(),
        output = %config.output.output_file.display(),
        max_attempts = config.products.max_retries,
        "Starting product pass"
    );

    let report = run_with_retries("products", config.products.max_retries, |n| {
        let attempt_collector = collector.fork();
        let pass = &pass;
        async move { pass.attempt(n, &attempt_collector).await }
    })
    .await;

    writer.sync()?;

    let counters = pass.counters();
    if counters.failed > 0 {
        tracing::error!(failed = counters.failed, "Failed to scrape some listing pages");
    }

    let summary = ProductPassSummary {
        cursor: pass.cursor(),
        products: writer.written(),
        counters,
        report,
    };

    tracing::info!(
        attempts = summary.report.attempts(),
        dispatched = summary.counters.dispatched,
        products = summary.products,
        success = summary.report.is_success(),
        "Product pass finished"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::ScriptedFetcher;
    use crate::fetch::RateLimiter;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.crawl.target_url = Some("https://shop.test/".to_string());
        config.output.categories_file = dir.path().join("leaf_categories.txt");
        config.output.output_file = dir.path().join("out/scraped_data.jsonl");
        config
    }

    fn collector(fetcher: ScriptedFetcher) -> Collector {
        Collector::new(
            Arc::new(fetcher),
            Arc::new(RateLimiter::unlimited()),
            2,
            Some(ITEM_DEPTH),
        )
    }

    #[tokio::test]
    async fn test_writes_output_and_summary() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        std::fs::write(&config.output.categories_file, "https://shop.test/b/1\n").unwrap();
        let fetcher = ScriptedFetcher::new()
            .page(
                "https://shop.test/b/1",
                r#"<a class="s-item__link" href="https://shop.test/itm/9">x</a>"#,
            )
            .page(
                "https://shop.test/itm/9",
                r#"<div class="vim x-vi-evo-main-container template-evo-avip">
                  <nav class="breadcrumbs"><ul><li><a href="/"><span>Toys</span></a></li></ul></nav>
                  <h1 class="x-item-title__mainTitle"><span class="ux-textspans ux-textspans--BOLD">Kite</span></h1>
                  <div class="x-price-primary"><span>US $5.00</span></div>
                </div>"#,
            );

        let summary = product_pass(&config, &collector(fetcher)).await.unwrap();

        assert!(summary.report.is_success());
        assert_eq!(summary.products, 1);
        assert_eq!(summary.cursor.line, 1);
        let text = std::fs::read_to_string(&config.output.output_file).unwrap();
        let product: Product = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(product.name, "Kite");
        assert_eq!(product.categories, vec!["Toys"]);
    }

    #[tokio::test]
    async fn test_missing_checkpoint_is_setup_error() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);

        let err = product_pass(&config, &collector(ScriptedFetcher::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, LeafwalkError::Io(_)));
    }

    #[tokio::test]
    async fn test_empty_checkpoint_succeeds_with_no_output() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        std::fs::write(&config.output.categories_file, "").unwrap();

        let summary = product_pass(&config, &collector(ScriptedFetcher::new())).await.unwrap();

        assert!(matches!(summary.report, RetryReport::Succeeded { attempts: 1 }));
        assert_eq!(summary.counters, PassCounters::default());
        assert_eq!(std::fs::read_to_string(&config.output.output_file).unwrap(), "");
    }
}
