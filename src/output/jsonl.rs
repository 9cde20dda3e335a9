//! JSON Lines record output

use crate::output::{LineWriter, OutputResult};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// Writes one JSON document per line
pub struct JsonLinesWriter<W: Write> {
    lines: LineWriter<W>,
    written: AtomicU64,
}

impl<W: Write> JsonLinesWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            lines: LineWriter::new(writer),
            written: AtomicU64::new(0),
        }
    }

    /// Serializes `record` and appends it as a single line
    pub fn write<T: Serialize>(&self, record: &T) -> OutputResult<()> {
        let line = serde_json::to_string(record)?;
        self.lines.write_line(&line)?;
        self.written.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Number of records written successfully
    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    pub fn flush(&self) -> OutputResult<()> {
        self.lines.flush()
    }

    pub fn into_inner(self) -> W {
        self.lines.into_inner()
    }
}

impl JsonLinesWriter<BufWriter<File>> {
    /// Creates (or truncates) the output file at `path`
    pub fn create(path: &Path) -> OutputResult<Self> {
        Ok(Self {
            lines: LineWriter::create(path)?,
            written: AtomicU64::new(0),
        })
    }

    /// Flushes and syncs the output file
    pub fn sync(&self) -> OutputResult<()> {
        self.lines.sync()
    }
}
