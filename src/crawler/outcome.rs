//! Single-slot outcome reporting for one visit
//!
//! Page handlers run on many tasks, and any of them may discover that the
//! attempt is doomed (a stalled connection). The first failure reported wins;
//! later reports are dropped without blocking. If every sender goes away
//! without reporting, the visit settled cleanly.

use crate::fetch::{Collector, PageHandler};
use crate::{CrawlError, VisitError};
use std::sync::Arc;
use tokio::sync::mpsc;
use url::Url;

/// Creates a connected sender/receiver pair with room for one outcome
pub fn outcome_slot() -> (OutcomeSender, OutcomeReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (OutcomeSender { tx }, OutcomeReceiver { rx })
}

/// Reports a failure for the visit in progress
#[derive(Debug, Clone)]
pub struct OutcomeSender {
    tx: mpsc::Sender<CrawlError>,
}

impl OutcomeSender {
    /// Offers `err` as the visit's outcome without blocking
    ///
    /// Returns false if an outcome was already reported or nobody is waiting.
    pub fn offer(&self, err: CrawlError) -> bool {
        match self.tx.try_send(err) {
            Ok(()) => true,
            Err(dropped) => {
                tracing::trace!("Outcome already reported, dropping: {}", dropped.into_inner());
                false
            }
        }
    }
}

/// Waits for the visit's outcome
#[derive(Debug)]
pub struct OutcomeReceiver {
    rx: mpsc::Receiver<CrawlError>,
}

impl OutcomeReceiver {
    /// Resolves with the first reported error, or `Ok` once every sender is gone
    pub async fn wait(mut self) -> Result<(), CrawlError> {
        match self.rx.recv().await {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Visits `url` on a background task and waits for its outcome
///
/// `make_handler` receives the sender the handler reports failures through.
/// A root-page failure that no handler reported is turned into a fatal
/// outcome. When the outcome is a failure the visit task is cancelled and
/// awaited, so nothing it started keeps writing after this returns.
pub async fn dispatch<H, F>(collector: &Collector, url: Url, make_handler: F) -> Result<(), CrawlError>
where
    H: PageHandler,
    F: FnOnce(OutcomeSender) -> H,
{
    let (sender, receiver) = outcome_slot();
    let handler = Arc::new(make_handler(sender.clone()));
    let collector = collector.clone();

    let mut visit = tokio::spawn(async move {
        if let Err(err) = collector.visit_url(url, handler).await {
            tracing::error!("Visiting Err: {}", err);
            sender.offer(CrawlError::Visit(err));
        }
    });

    match receiver.wait().await {
        Ok(()) => match (&mut visit).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::error!("Visit task failed: {}", e);
                Err(CrawlError::Visit(VisitError::Aborted))
            }
        },
        Err(err) => {
            visit.abort();
            let _ = visit.await;
            Err(err)
        }
    }
}
