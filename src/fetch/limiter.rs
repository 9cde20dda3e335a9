//! Request pacing for matching hosts
//!
//! Requests to hosts matching the configured domain glob start no sooner than
//! `delay + random(0..=random_delay)` after the previous matching request
//! started. Other hosts are not paced.

use crate::config::FetchConfig;
use crate::url::url_matches_glob;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use url::Url;

/// Paces request starts against a domain glob
#[derive(Debug)]
pub struct RateLimiter {
    domain_glob: String,
    delay: Duration,
    random_delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(domain_glob: impl Into<String>, delay: Duration, random_delay: Duration) -> Self {
        Self {
            domain_glob: domain_glob.into(),
            delay,
            random_delay,
            last_request: Mutex::new(None),
        }
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(config.domain_glob.clone(), config.delay(), config.random_delay())
    }

    /// A limiter that never waits
    pub fn unlimited() -> Self {
        Self::new("*", Duration::ZERO, Duration::ZERO)
    }

    /// Returns true if requests to this URL are paced
    pub fn applies_to(&self, url: &Url) -> bool {
        url_matches_glob(&self.domain_glob, url)
    }

    /// Waits until a request to `url` may start
    ///
    /// The lock is held while sleeping so concurrent callers queue up behind
    /// each other instead of all firing when the same slot opens.
    pub async fn wait(&self, url: &Url) {
        if !self.applies_to(url) || (self.delay.is_zero() && self.random_delay.is_zero()) {
            return;
        }

        let mut last_request = self.last_request.lock().await;
        if let Some(previous) = *last_request {
            let ready_at = previous + self.delay + self.jitter();
            if ready_at > Instant::now() {
                tracing::trace!(url = %url, "Pacing request");
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last_request = Some(Instant::now());
    }

    fn jitter(&self) -> Duration {
        let max = self.random_delay.as_millis() as u64;
        if max == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(fastrand::u64(0..=max))
        }
    }
}
