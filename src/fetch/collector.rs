//! The collector: Leafwalk's fetch engine
//!
//! A [`Collector`] owns the fetcher, the rate limiter, a concurrency limit and
//! a visited set. [`Collector::visit`] fetches one root page, hands it to a
//! [`PageHandler`], and then keeps fetching whatever the handler schedules
//! through the [`VisitQueue`] until nothing is left. Child pages run on their
//! own tokio tasks, so siblings may complete in any order.
//!
//! Errors on the root page are returned from `visit`. Errors on child pages
//! only reach [`PageHandler::on_error`].

use crate::config::FetchConfig;
use crate::fetch::client::{Fetcher, ReqwestFetcher, Response};
use crate::fetch::limiter::RateLimiter;
use crate::fetch::page::Page;
use crate::url::{parse_absolute, resolve_link};
use crate::{FetchError, VisitError};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

/// A page request with its depth below the visit's root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub url: Url,
    pub depth: u32,
}

/// Callbacks invoked by the collector for every request
///
/// Everything except `on_html` has a logging default.
pub trait PageHandler: Send + Sync + 'static {
    /// Called before a request is sent
    fn on_request(&self, request: &Request) {
        tracing::info!(url = %request.url, "Visiting");
    }

    /// Called after a successful response arrives
    fn on_response(&self, request: &Request, _response: &Response) {
        tracing::info!(url = %request.url, "Visited");
    }

    /// Called when a request fails, on the root page and on children alike
    fn on_error(&self, request: &Request, error: &FetchError) {
        tracing::error!(
            url = %request.url,
            status_code = error.status_code(),
            "Request failed: {}",
            error
        );
    }

    /// Called with the parsed document of every HTML response
    fn on_html(&self, page: &Page, queue: &VisitQueue<'_>);

    /// Called after `on_html` has returned
    fn on_scraped(&self, request: &Request) {
        tracing::info!(url = %request.url, "Scraped");
    }
}

/// Anything that can schedule a follow-up visit for an href
///
/// Implemented by [`VisitQueue`]; the seam lets page logic be tested without
/// a collector.
pub trait LinkQueue {
    /// Schedules a visit, returning the resolved URL
    ///
    /// Errors are pre-flight only (bad href, repeat visit, depth limit); the
    /// fetch itself happens later.
    fn visit(&self, href: &str) -> Result<Url, VisitError>;
}

/// Schedules child visits from inside `on_html`
pub struct VisitQueue<'a> {
    collector: &'a Collector,
    parent: &'a Request,
    sender: &'a UnboundedSender<Request>,
}

impl LinkQueue for VisitQueue<'_> {
    fn visit(&self, href: &str) -> Result<Url, VisitError> {
        let url = resolve_link(href, &self.parent.url)?;
        let depth = self.parent.depth + 1;

        if let Some(max_depth) = self.collector.inner.max_depth {
            if depth > max_depth {
                return Err(VisitError::MaxDepth(max_depth));
            }
        }

        self.collector.mark_visited(&url)?;
        self.sender
            .send(Request {
                url: url.clone(),
                depth,
            })
            .map_err(|_| VisitError::Aborted)?;

        Ok(url)
    }
}

struct CollectorInner {
    fetcher: Arc<dyn Fetcher>,
    limiter: Arc<RateLimiter>,
    permits: Semaphore,
    parallelism: usize,
    visited: Mutex<HashSet<String>>,
    max_depth: Option<u32>,
}

/// The fetch engine
///
/// Cloning shares the visited set; use [`Collector::fork`] for a fresh one.
#[derive(Clone)]
pub struct Collector {
    inner: Arc<CollectorInner>,
}

impl Collector {
    /// Creates a collector
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Performs the actual HTTP requests
    /// * `limiter` - Paces request starts
    /// * `parallelism` - Maximum number of requests in flight
    /// * `max_depth` - Deepest child depth that may be scheduled (None for unbounded)
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        limiter: Arc<RateLimiter>,
        parallelism: usize,
        max_depth: Option<u32>,
    ) -> Self {
        Self {
            inner: Arc::new(CollectorInner {
                fetcher,
                limiter,
                permits: Semaphore::new(parallelism.max(1)),
                parallelism: parallelism.max(1),
                visited: Mutex::new(HashSet::new()),
                max_depth,
            }),
        }
    }

    /// Creates a collector backed by a [`ReqwestFetcher`]
    pub fn from_config(config: &FetchConfig, max_depth: Option<u32>) -> Result<Self, reqwest::Error> {
        let fetcher = Arc::new(ReqwestFetcher::new(config)?);
        let limiter = Arc::new(RateLimiter::from_config(config));
        Ok(Self::new(fetcher, limiter, config.parallelism, max_depth))
    }

    /// A collector sharing this one's fetcher and limiter with an empty visited set
    pub fn fork(&self) -> Self {
        Self::new(
            Arc::clone(&self.inner.fetcher),
            Arc::clone(&self.inner.limiter),
            self.inner.parallelism,
            self.inner.max_depth,
        )
    }

    /// Number of URLs visited or scheduled so far
    pub fn visited_count(&self) -> usize {
        self.visited().len()
    }

    /// Visits `url` and everything the handler schedules from it
    ///
    /// Returns once the whole tree of scheduled visits has settled. The error
    /// is the root page's pre-flight or fetch failure; child failures are
    /// reported to `on_error` only.
    pub async fn visit<H: PageHandler>(&self, url: &str, handler: Arc<H>) -> Result<(), VisitError> {
        let url = parse_absolute(url)?;
        self.visit_url(url, handler).await
    }

    /// Like [`Collector::visit`] for an already parsed URL
    pub async fn visit_url<H: PageHandler>(&self, url: Url, handler: Arc<H>) -> Result<(), VisitError> {
        self.mark_visited(&url)?;

        let (sender, mut receiver) = mpsc::unbounded_channel();
        let root = Request { url, depth: 0 };
        self.process(root, handler.as_ref(), &sender).await?;

        let mut tasks = JoinSet::new();
        loop {
            while let Ok(request) = receiver.try_recv() {
                let collector = self.clone();
                let handler = Arc::clone(&handler);
                let sender = sender.clone();
                tasks.spawn(async move {
                    // Child failures were already reported through on_error
                    let _ = collector.process(request, handler.as_ref(), &sender).await;
                });
            }

            if tasks.is_empty() {
                break;
            }

            if let Some(Err(e)) = tasks.join_next().await {
                if e.is_panic() {
                    tracing::error!("Visit task panicked: {}", e);
                }
            }
        }

        Ok(())
    }

    async fn process<H: PageHandler>(
        &self,
        request: Request,
        handler: &H,
        sender: &UnboundedSender<Request>,
    ) -> Result<(), VisitError> {
        let _permit = self
            .inner
            .permits
            .acquire()
            .await
            .map_err(|_| VisitError::Aborted)?;

        self.inner.limiter.wait(&request.url).await;
        handler.on_request(&request);

        let response = match self.inner.fetcher.fetch(&request.url).await {
            Ok(response) => response,
            Err(err) => {
                handler.on_error(&request, &err);
                return Err(err.into());
            }
        };

        handler.on_response(&request, &response);

        if response.is_html() {
            let page = Page::parse(request.clone(), &response.body);
            let queue = VisitQueue {
                collector: self,
                parent: &request,
                sender,
            };
            handler.on_html(&page, &queue);
        } else {
            tracing::debug!(
                url = %request.url,
                content_type = %response.content_type,
                "Skipping non-HTML response"
            );
        }

        handler.on_scraped(&request);
        Ok(())
    }

    fn mark_visited(&self, url: &Url) -> Result<(), VisitError> {
        if self.visited().insert(url.as_str().to_string()) {
            Ok(())
        } else {
            Err(VisitError::AlreadyVisited(url.to_string()))
        }
    }

    fn visited(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.inner
            .visited
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
