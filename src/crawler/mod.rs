//! The category pass
//!
//! This module contains the category-tree traversal, including:
//! - Classifying pages as leaves or branches
//! - Scheduling child categories from branch pages
//! - Checkpointing leaf URLs to a file
//! - Retrying traversals that stall

mod classifier;
mod driver;
mod expander;
mod outcome;
mod retry;
mod sink;

pub use classifier::{is_leaf, is_root_page, FEATURE_MODULE_SELECTORS, SHOP_BY_CATEGORY};
pub use driver::{CategoryHandler, CrawlDriver};
pub use expander::{expand, expand_layout, NavLayout, LAYOUTS, NAV_LAYOUT, SECTION_LAYOUT};
pub use outcome::{dispatch, outcome_slot, OutcomeReceiver, OutcomeSender};
pub use retry::{run_with_retries, RetryReport};
pub use sink::LeafSink;

use crate::config::Config;
use crate::fetch::Collector;
use crate::url::parse_absolute;
use crate::{ConfigError, CrawlError, LeafwalkError};
use std::sync::Arc;

/// Runs the category pass described by `config`
///
/// Creates (or truncates) the checkpoint file, then traverses the category
/// tree from the target URL under the retry loop. A pass that exhausts its
/// retries or fails fatally is still `Ok`: the checkpoint keeps whatever was
/// found and the caller decides what to do next. Errors are reserved for
/// setup failures.
pub async fn run_category_pass(config: &Config) -> Result<RetryReport, LeafwalkError> {
    let collector = Collector::from_config(&config.fetch, None)?;
    category_pass(config, &collector).await
}

/// Like [`run_category_pass`] with a caller-supplied collector
///
/// Every attempt runs on a fork of `collector`, so each one starts with an
/// empty visited set.
pub async fn category_pass(config: &Config, collector: &Collector) -> Result<RetryReport, LeafwalkError> {
    let target = config
        .target_url()
        .ok_or(ConfigError::Missing("target URL"))?;
    let root = parse_absolute(target).map_err(CrawlError::from)?;

    let checkpoint = &config.output.categories_file;
    let sink = Arc::new(LeafSink::create(checkpoint, config.crawl.dedupe_leaves)?);
    let driver = CrawlDriver::new(root, config.crawl.max_categories_per_page, Arc::clone(&sink));

    tracing::info!(
        url = %driver.root(),
        checkpoint = %checkpoint.display(),
        max_attempts = config.crawl.max_retries,
        "Starting category pass"
    );

    let report = run_with_retries("categories", config.crawl.max_retries, |_| {
        let attempt_collector = collector.fork();
        let driver = &driver;
        async move { driver.traverse(&attempt_collector).await }
    })
    .await;

    sink.close()?;

    tracing::info!(
        attempts = report.attempts(),
        leaves = sink.recorded(),
        success = report.is_success(),
        "Category pass finished"
    );

    Ok(report)
}
