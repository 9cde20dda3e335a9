//! In-memory fetcher for unit tests
//!
//! Each URL gets a script of outcomes. Outcomes are consumed in order and the
//! last one repeats forever, so `.stall(u).page(u, body)` stalls once and then
//! serves the page. Unscripted URLs answer 404.

use crate::fetch::client::{Fetcher, Response};
use crate::FetchError;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use url::Url;

#[derive(Debug, Clone)]
enum Outcome {
    Page(String),
    Status(u16),
    Stall,
}

#[derive(Default)]
pub(crate) struct ScriptedFetcher {
    scripts: Mutex<HashMap<String, VecDeque<Outcome>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn push(self, url: &str, outcome: Outcome) -> Self {
        let key = Url::parse(url).unwrap().to_string();
        self.scripts
            .lock()
            .unwrap()
            .entry(key)
            .or_default()
            .push_back(outcome);
        self
    }

    pub(crate) fn page(self, url: &str, body: &str) -> Self {
        let body = format!("<html><body>{}</body></html>", body);
        self.push(url, Outcome::Page(body))
    }

    pub(crate) fn status(self, url: &str, status: u16) -> Self {
        self.push(url, Outcome::Status(status))
    }

    pub(crate) fn stall(self, url: &str) -> Self {
        self.push(url, Outcome::Stall)
    }

    /// Number of fetches made for `url`
    pub(crate) fn calls_to(&self, url: &str) -> usize {
        let key = Url::parse(url).unwrap().to_string();
        self.calls.lock().unwrap().iter().filter(|c| **c == key).count()
    }

    /// All fetched URLs in call order
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &Url) -> Result<Response, FetchError> {
        let key = url.to_string();
        self.calls.lock().unwrap().push(key.clone());

        let outcome = {
            let mut scripts = self.scripts.lock().unwrap();
            match scripts.get_mut(&key) {
                Some(script) if script.len() > 1 => script.pop_front(),
                Some(script) => script.front().cloned(),
                None => None,
            }
        };

        match outcome {
            Some(Outcome::Page(body)) => Ok(Response::html(key, body)),
            Some(Outcome::Status(status)) => Err(FetchError::Status { url: key, status }),
            Some(Outcome::Stall) => Err(FetchError::Transport {
                url: key,
                message: "request timeout".to_string(),
            }),
            None => Err(FetchError::Status {
                url: key,
                status: 404,
            }),
        }
    }
}
