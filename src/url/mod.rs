//! URL helpers for Leafwalk
//!
//! Parsing of checkpoint lines and hrefs into absolute URLs, query stripping
//! for product links, and domain-glob matching for the rate limiter.

mod glob;
mod link;

pub use glob::{host_matches_glob, url_matches_glob};
pub use link::{parse_absolute, resolve_link, strip_query};
