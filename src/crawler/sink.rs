//! The leaf checkpoint sink
//!
//! Every leaf page found during the category pass is appended to the
//! checkpoint file as one URL per line. The file is created (or truncated)
//! once per pass and shared by every traversal attempt, so a retried attempt
//! keeps the leaves found before the stall.

use crate::output::{LineWriter, OutputResult};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use url::Url;

/// Appends leaf URLs to the checkpoint
pub struct LeafSink<W: Write> {
    lines: LineWriter<W>,
    seen: Option<Mutex<HashSet<String>>>,
    recorded: AtomicU64,
}

impl<W: Write> LeafSink<W> {
    /// Creates a sink over `writer`
    ///
    /// With `dedupe` set, a URL already recorded by this sink is not written
    /// again, even by a later attempt.
    pub fn new(writer: W, dedupe: bool) -> Self {
        Self {
            lines: LineWriter::new(writer),
            seen: dedupe.then(|| Mutex::new(HashSet::new())),
            recorded: AtomicU64::new(0),
        }
    }

    /// Records a leaf page URL
    ///
    /// Write failures are logged and swallowed so the traversal continues.
    /// Returns true if a line was written.
    pub fn record(&self, url: &Url) -> bool {
        let mut seen = self
            .seen
            .as_ref()
            .map(|seen| seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner()));

        if let Some(seen) = &seen {
            if seen.contains(url.as_str()) {
                tracing::debug!(url = %url, "Leaf already recorded");
                return false;
            }
        }

        if let Err(e) = self.lines.write_line(url.as_str()) {
            tracing::error!(url = %url, "Failed to write leaf category: {}", e);
            return false;
        }

        if let Some(seen) = seen.as_mut() {
            seen.insert(url.as_str().to_string());
        }
        self.recorded.fetch_add(1, Ordering::Relaxed);
        tracing::info!(url = %url, "Leaf category recorded");
        true
    }

    /// Number of URLs written so far
    pub fn recorded(&self) -> u64 {
        self.recorded.load(Ordering::Relaxed)
    }

    pub fn flush(&self) -> OutputResult<()> {
        self.lines.flush()
    }

    pub fn into_inner(self) -> W {
        self.lines.into_inner()
    }
}

impl LeafSink<BufWriter<File>> {
    /// Creates (or truncates) the checkpoint file at `path`
    pub fn create(path: &Path, dedupe: bool) -> OutputResult<Self> {
        Ok(Self {
            lines: LineWriter::create(path)?,
            seen: dedupe.then(|| Mutex::new(HashSet::new())),
            recorded: AtomicU64::new(0),
        })
    }

    /// Flushes and syncs the checkpoint so the product pass sees every line
    pub fn close(&self) -> OutputResult<()> {
        self.lines.sync()
    }
}
