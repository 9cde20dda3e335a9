//! Shared line-oriented writer
//!
//! Both output files of a run (the leaf checkpoint and the product records)
//! are newline-terminated text written from many visit tasks at once. The
//! writer serializes those appends behind a mutex so lines never interleave.

use crate::output::OutputResult;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// A thread-safe appender of newline-terminated lines
pub struct LineWriter<W: Write> {
    writer: Mutex<W>,
}

impl<W: Write> LineWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Appends `line` followed by a newline as one write
    pub fn write_line(&self, line: &str) -> OutputResult<()> {
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');
        self.lock().write_all(buf.as_bytes())?;
        Ok(())
    }

    pub fn flush(&self) -> OutputResult<()> {
        self.lock().flush()?;
        Ok(())
    }

    /// Consumes the writer, returning the underlying sink
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock(&self) -> MutexGuard<'_, W> {
        self.writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LineWriter<BufWriter<File>> {
    /// Creates (or truncates) `path`, creating missing parent directories
    pub fn create(path: &Path) -> OutputResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }

    /// Flushes buffered lines and syncs the file to stable storage
    pub fn sync(&self) -> OutputResult<()> {
        let mut writer = self.lock();
        writer.flush()?;
        writer.get_ref().sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lines_are_newline_terminated() {
        let writer = LineWriter::new(Vec::new());
        writer.write_line("first").unwrap();
        writer.write_line("second").unwrap();

        assert_eq!(writer.into_inner(), b"first\nsecond\n");
    }

    #[test]
    fn test_create_truncates_and_makes_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/out/leaves.txt");

        let writer = LineWriter::create(&path).unwrap();
        writer.write_line("old").unwrap();
        writer.sync().unwrap();
        drop(writer);

        let writer = LineWriter::create(&path).unwrap();
        writer.write_line("new").unwrap();
        writer.sync().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
    }

    #[test]
    fn test_concurrent_writes_do_not_interleave() {
        let writer = std::sync::Arc::new(LineWriter::new(Vec::new()));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let writer = std::sync::Arc::clone(&writer);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        writer.write_line(&format!("thread-{}-line-{}", t, i)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let writer = std::sync::Arc::try_unwrap(writer).ok().unwrap();
        let text = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 400);
        assert!(lines.iter().all(|l| l.starts_with("thread-") && l.contains("-line-")));
    }
}
