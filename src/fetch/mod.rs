//! Fetch engine for Leafwalk
//!
//! This module contains everything between a URL and a parsed page:
//! - HTTP fetching with user agent rotation and timeouts
//! - An on-disk response cache
//! - Request pacing for the target site's hosts
//! - The collector, which runs visits concurrently and calls page handlers

mod cache;
mod client;
mod collector;
mod limiter;
mod page;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{CacheEntry, ResponseCache};
pub use client::{build_http_client, random_user_agent, Fetcher, ReqwestFetcher, Response};
pub use collector::{Collector, LinkQueue, PageHandler, Request, VisitQueue};
pub use limiter::RateLimiter;
pub use page::{attr, child_text, select, text_of, Page};
