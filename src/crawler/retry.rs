//! Bounded retry loop shared by both passes
//!
//! An attempt either succeeds, stalls (recoverable: try again), or fails
//! fatally (stop now). Attempts are never delayed; pacing between requests is
//! the rate limiter's job.

use crate::CrawlError;
use std::future::Future;

/// How a retried pass ended
#[derive(Debug)]
pub enum RetryReport {
    /// An attempt completed without a stall
    Succeeded { attempts: u32 },

    /// Every attempt stalled
    Exhausted {
        attempts: u32,
        last_error: Option<CrawlError>,
    },

    /// An attempt failed with a non-recoverable error
    Aborted { attempt: u32, error: CrawlError },
}

impl RetryReport {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// Number of attempts that were started
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Succeeded { attempts } | Self::Exhausted { attempts, .. } => *attempts,
            Self::Aborted { attempt, .. } => *attempt,
        }
    }

    /// The error that ended the loop, if it did not succeed
    pub fn error(&self) -> Option<&CrawlError> {
        match self {
            Self::Succeeded { .. } => None,
            Self::Exhausted { last_error, .. } => last_error.as_ref(),
            Self::Aborted { error, .. } => Some(error),
        }
    }
}

/// Runs `attempt` until it succeeds, fails fatally, or `max_attempts` stalls
///
/// `attempt` receives the 1-based attempt number.
pub async fn run_with_retries<F, Fut>(pass: &str, max_attempts: u32, mut attempt: F) -> RetryReport
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<(), CrawlError>>,
{
    let mut last_error = None;

    for n in 1..=max_attempts {
        tracing::debug!(pass = pass, attempt = n, max_attempts = max_attempts, "Starting attempt");

        match attempt(n).await {
            Ok(()) => {
                tracing::info!(pass = pass, attempt = n, "Pass completed");
                return RetryReport::Succeeded { attempts: n };
            }
            Err(err) if err.is_recoverable() => {
                tracing::warn!(
                    pass = pass,
                    attempt = n,
                    "Connection stalled. Retrying... {}",
                    err
                );
                last_error = Some(err);
            }
            Err(err) => {
                tracing::error!(pass = pass, attempt = n, "Pass failed: {}", err);
                return RetryReport::Aborted { attempt: n, error: err };
            }
        }
    }

    tracing::error!(
        pass = pass,
        max_attempts = max_attempts,
        "Failed after maximum retry attempts"
    );
    RetryReport::Exhausted {
        attempts: max_attempts,
        last_error,
    }
}
