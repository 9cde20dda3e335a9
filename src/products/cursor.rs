//! Byte-offset cursor over the checkpoint file
//!
//! The product pass remembers how far into the checkpoint it got. A retried
//! attempt reopens the file and seeks straight to that offset instead of
//! starting over.

use std::io::{self, SeekFrom};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};

/// Position of the next unprocessed checkpoint line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadCursor {
    /// Byte offset of the line's first byte
    pub offset: u64,

    /// Zero-based number of the line
    pub line: u64,
}

impl ReadCursor {
    /// Moves past `line`
    pub fn advance(&mut self, line: &CheckpointLine) {
        self.offset += line.len;
        self.line += 1;
    }
}

/// One line of the checkpoint file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointLine {
    /// Line content without the terminator, trimmed
    pub text: String,

    /// Raw length in bytes, terminator included
    pub len: u64,
}

/// Line reader positioned at a [`ReadCursor`]
pub struct CheckpointReader {
    reader: BufReader<File>,
    buf: Vec<u8>,
}

impl CheckpointReader {
    /// Opens `path` and seeks to `cursor`
    pub async fn open_at(path: &Path, cursor: ReadCursor) -> io::Result<Self> {
        let mut file = File::open(path).await?;
        file.seek(SeekFrom::Start(cursor.offset)).await?;

        Ok(Self {
            reader: BufReader::new(file),
            buf: Vec::new(),
        })
    }

    /// Reads the next line, or `None` at end of file
    ///
    /// A last line without a trailing newline is still returned.
    pub async fn next_line(&mut self) -> io::Result<Option<CheckpointLine>> {
        self.buf.clear();
        let len = self.reader.read_until(b'\n', &mut self.buf).await?;
        if len == 0 {
            return Ok(None);
        }

        let text = String::from_utf8_lossy(&self.buf).trim().to_string();
        Ok(Some(CheckpointLine {
            text,
            len: len as u64,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn read_all(path: &Path, cursor: ReadCursor) -> Vec<(ReadCursor, String)> {
        let mut reader = CheckpointReader::open_at(path, cursor).await.unwrap();
        let mut cursor = cursor;
        let mut seen = Vec::new();
        while let Some(line) = reader.next_line().await.unwrap() {
            seen.push((cursor, line.text.clone()));
            cursor.advance(&line);
        }
        seen
    }

    #[tokio::test]
    async fn test_reads_lines_with_offsets() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("leaves.txt");
        std::fs::write(&path, "https://a.test/\nhttps://bb.test/\n").unwrap();

        let lines = read_all(&path, ReadCursor::default()).await;
        assert_eq!(
            lines,
            vec![
                (ReadCursor { offset: 0, line: 0 }, "https://a.test/".to_string()),
                (ReadCursor { offset: 16, line: 1 }, "https://bb.test/".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_resumes_from_cursor() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("leaves.txt");
        std::fs::write(&path, "one\ntwo\nthree\n").unwrap();

        let lines = read_all(&path, ReadCursor { offset: 4, line: 1 }).await;
        let texts: Vec<&str> = lines.iter().map(|(_, t)| t.as_str()).collect();
        assert_eq!(texts, vec!["two", "three"]);
        assert_eq!(lines[1].0, ReadCursor { offset: 8, line: 2 });
    }

    #[tokio::test]
    async fn test_last_line_without_newline() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("leaves.txt");
        std::fs::write(&path, "one\r\ntail").unwrap();

        let mut reader = CheckpointReader::open_at(&path, ReadCursor::default())
            .await
            .unwrap();
        let first = reader.next_line().await.unwrap().unwrap();
        assert_eq!(first.text, "one");
        assert_eq!(first.len, 5);
        let last = reader.next_line().await.unwrap().unwrap();
        assert_eq!(last.text, "tail");
        assert_eq!(last.len, 4);
        assert!(reader.next_line().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cursor_at_end_reads_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("leaves.txt");
        std::fs::write(&path, "one\n").unwrap();

        assert!(read_all(&path, ReadCursor { offset: 4, line: 1 }).await.is_empty());
    }
}
