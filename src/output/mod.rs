//! Output files written by a crawl run
//!
//! This module handles:
//! - Appending newline-terminated lines from concurrent visit tasks
//! - Serializing product records as JSON Lines
//! - Flushing and syncing output files when a pass ends

mod jsonl;
mod lines;

pub use jsonl::JsonLinesWriter;
pub use lines::LineWriter;

use thiserror::Error;

/// Errors that can occur while writing output
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

impl From<OutputError> for std::io::Error {
    fn from(err: OutputError) -> Self {
        match err {
            OutputError::Io(e) => e,
            OutputError::Serialize(e) => e.into(),
        }
    }
}
