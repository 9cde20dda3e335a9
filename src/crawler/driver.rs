//! Category tree traversal
//!
//! One traversal attempt visits the root page and follows child categories
//! until the tree is exhausted or a connection stalls. Leaves go to the
//! checkpoint sink; branches are expanded.

use crate::crawler::classifier::is_leaf;
use crate::crawler::expander::expand;
use crate::crawler::outcome::{dispatch, OutcomeSender};
use crate::crawler::sink::LeafSink;
use crate::fetch::{Collector, Page, PageHandler, Request, VisitQueue};
use crate::{CrawlError, FetchError};
use std::io::Write;
use std::sync::Arc;
use url::Url;

/// Page handler for the category pass
pub struct CategoryHandler<W: Write + Send + 'static> {
    root: Url,
    max_categories: usize,
    sink: Arc<LeafSink<W>>,
    outcome: OutcomeSender,
}

impl<W: Write + Send + 'static> PageHandler for CategoryHandler<W> {
    fn on_error(&self, request: &Request, error: &FetchError) {
        tracing::error!(
            url = %request.url,
            status_code = error.status_code(),
            depth = request.depth,
            "Request failed: {}",
            error
        );

        if error.is_stall() {
            self.outcome.offer(CrawlError::Stalled {
                url: request.url.to_string(),
            });
        }
    }

    fn on_html(&self, page: &Page, queue: &VisitQueue<'_>) {
        if is_leaf(page, &self.root) {
            self.sink.record(page.url());
        } else {
            let scheduled = expand(page, self.max_categories, queue);
            tracing::debug!(url = %page.url(), scheduled = scheduled, "Expanded branch page");
        }
    }
}

/// Runs traversal attempts against one root and one checkpoint sink
pub struct CrawlDriver<W: Write + Send + 'static> {
    root: Url,
    max_categories: usize,
    sink: Arc<LeafSink<W>>,
}

impl<W: Write + Send + 'static> CrawlDriver<W> {
    pub fn new(root: Url, max_categories: usize, sink: Arc<LeafSink<W>>) -> Self {
        Self {
            root,
            max_categories,
            sink,
        }
    }

    pub fn root(&self) -> &Url {
        &self.root
    }

    /// Runs one traversal attempt with `collector`
    ///
    /// Resolves `Ok` once every scheduled page has settled, or with the first
    /// stall reported by any page. A failing root page is fatal.
    pub async fn traverse(&self, collector: &Collector) -> Result<(), CrawlError> {
        tracing::info!(url = %self.root, "Started scraping root category page");

        dispatch(collector, self.root.clone(), |outcome| CategoryHandler {
            root: self.root.clone(),
            max_categories: self.max_categories,
            sink: Arc::clone(&self.sink),
            outcome,
        })
        .await
    }
}
