//! The product pass driver
//!
//! Walks the checkpoint file line by line. Every leaf URL is visited as a
//! listing page (depth 0); the product links found there are visited as item
//! pages (depth 1) and turned into JSON records. A stalled listing page ends
//! the attempt and leaves the cursor on that line, so the next attempt starts
//! with it.

use crate::crawler::{dispatch, OutcomeSender};
use crate::fetch::{Collector, LinkQueue, Page, PageHandler, Request, VisitQueue};
use crate::output::JsonLinesWriter;
use crate::products::cursor::{CheckpointReader, ReadCursor};
use crate::products::extract::{extract_products, product_links};
use crate::url::parse_absolute;
use crate::{CrawlError, FetchError, VisitError};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Depth of item pages below their listing page
pub const ITEM_DEPTH: u32 = 1;

/// Page handler for listing and item pages
pub struct ProductHandler<W: Write + Send + 'static> {
    max_products: usize,
    writer: Arc<JsonLinesWriter<W>>,
    outcome: OutcomeSender,
}

impl<W: Write + Send + 'static> ProductHandler<W> {
    fn scrape_listing(&self, page: &Page, queue: &VisitQueue<'_>) {
        for link in product_links(page, self.max_products) {
            if let Err(e) = queue.visit(&link) {
                match e {
                    VisitError::AlreadyVisited(_) => {
                        tracing::debug!(url = %link, "Product already scraped")
                    }
                    _ => tracing::error!(url = %link, "Visiting Err: {}", e),
                }
            }
        }
    }

    fn scrape_details(&self, page: &Page) {
        tracing::debug!(url = %page.url(), "Scraping product details");

        for product in extract_products(page) {
            match product {
                Ok(product) => {
                    if let Err(e) = self.writer.write(&product) {
                        tracing::error!(url = %page.url(), "Error writing product: {}", e);
                    }
                }
                Err(e) => tracing::warn!(url = %page.url(), "{}", e),
            }
        }
    }
}

impl<W: Write + Send + 'static> PageHandler for ProductHandler<W> {
    fn on_error(&self, request: &Request, error: &FetchError) {
        tracing::error!(
            url = %request.url,
            status_code = error.status_code(),
            depth = request.depth,
            "Requesting Err: {}",
            error
        );

        // Item page failures never fail the line
        if request.depth == 0 && error.is_stall() {
            self.outcome.offer(CrawlError::Stalled {
                url: request.url.to_string(),
            });
        }
    }

    fn on_html(&self, page: &Page, queue: &VisitQueue<'_>) {
        if page.depth() == 0 {
            self.scrape_listing(page, queue);
        } else {
            self.scrape_details(page);
        }
    }
}

/// Counters accumulated over every attempt of a product pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassCounters {
    /// Listing URLs handed to the fetch engine
    pub dispatched: u64,

    /// Lines whose visit failed with a non-recoverable error
    pub failed: u64,

    /// Lines that did not parse as a URL
    pub invalid: u64,

    /// Lines repeating a URL already visited in the same attempt
    pub duplicates: u64,
}

/// State of one product pass: the checkpoint, the output and the cursor
pub struct ProductPass<W: Write + Send + 'static> {
    checkpoint: PathBuf,
    max_products: usize,
    writer: Arc<JsonLinesWriter<W>>,
    cursor: Mutex<ReadCursor>,
    counters: Mutex<PassCounters>,
}

impl<W: Write + Send + 'static> ProductPass<W> {
    pub fn new(checkpoint: &Path, max_products: usize, writer: Arc<JsonLinesWriter<W>>) -> Self {
        Self {
            checkpoint: checkpoint.to_path_buf(),
            max_products,
            writer,
            cursor: Mutex::new(ReadCursor::default()),
            counters: Mutex::new(PassCounters::default()),
        }
    }

    /// Position of the next line to process
    pub fn cursor(&self) -> ReadCursor {
        *lock(&self.cursor)
    }

    pub fn counters(&self) -> PassCounters {
        *lock(&self.counters)
    }

    /// Runs one attempt from the current cursor to end of file
    ///
    /// Returns `Stalled` as soon as a listing page stalls, without moving the
    /// cursor past that line. I/O errors on the checkpoint are fatal.
    pub async fn attempt(&self, attempt: u32, collector: &Collector) -> Result<(), CrawlError> {
        let mut cursor = self.cursor();
        tracing::info!(
            attempt = attempt,
            line = cursor.line + 1,
            offset = cursor.offset,
            "Reading checkpoint"
        );

        let mut reader = CheckpointReader::open_at(&self.checkpoint, cursor).await?;

        while let Some(line) = reader.next_line().await? {
            tracing::debug!(line = cursor.line + 1, offset = cursor.offset, "Read checkpoint line");

            if !line.text.is_empty() {
                self.process_line(attempt, &line.text, collector).await?;
            }

            cursor.advance(&line);
            *lock(&self.cursor) = cursor;
        }

        tracing::info!(attempt = attempt, lines = cursor.line, "Reached end of checkpoint");
        Ok(())
    }

    async fn process_line(&self, attempt: u32, text: &str, collector: &Collector) -> Result<(), CrawlError> {
        let url = match parse_absolute(text) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!(line = %text, "URL parsing error: {}", e);
                lock(&self.counters).invalid += 1;
                return Ok(());
            }
        };

        lock(&self.counters).dispatched += 1;
        let result = dispatch(collector, url.clone(), |outcome| ProductHandler {
            max_products: self.max_products,
            writer: Arc::clone(&self.writer),
            outcome,
        })
        .await;

        match result {
            Ok(()) => {
                tracing::info!(url = %url, "Listing page scraped");
                Ok(())
            }
            Err(err) if err.is_recoverable() => {
                tracing::warn!(attempt = attempt, url = %url, "Connection stalled on listing page");
                Err(err)
            }
            Err(CrawlError::Visit(VisitError::AlreadyVisited(_))) => {
                tracing::debug!(url = %url, "Listing page already scraped in this attempt");
                lock(&self.counters).duplicates += 1;
                Ok(())
            }
            Err(err) => {
                tracing::error!(url = %url, "Failed to scrape listing page: {}", err);
                lock(&self.counters).failed += 1;
                Ok(())
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
