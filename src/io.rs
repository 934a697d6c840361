//! Low-level I/O: the shared line sink.
//!
//! Multiple producers may hand finished lines to one file without racing;
//! the mutex is the synchronization point and writes of a full line are
//! atomic with respect to each other.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use crate::error::{FonError, Result};

/// A thread-safe writer that appends LF-terminated lines to a file and
/// tracks how many it has written.
#[derive(Debug)]
pub struct LineSink {
    inner: Mutex<SinkState>,
}

#[derive(Debug)]
struct SinkState {
    writer: BufWriter<File>,
    lines_written: u64,
}

impl LineSink {
    /// Creates the sink, truncating any existing file at `path`.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            inner: Mutex::new(SinkState {
                writer: BufWriter::new(file),
                lines_written: 0,
            }),
        })
    }

    /// Appends one line plus its LF terminator.
    pub fn write_line(&self, line: &str) -> Result<()> {
        let mut state = self.lock()?;
        state.writer.write_all(line.as_bytes())?;
        state.writer.write_all(b"\n")?;
        state.lines_written += 1;
        Ok(())
    }

    /// Appends a batch of lines under a single lock acquisition.
    pub fn write_lines<'a>(&self, lines: impl IntoIterator<Item = &'a str>) -> Result<()> {
        let mut state = self.lock()?;
        for line in lines {
            state.writer.write_all(line.as_bytes())?;
            state.writer.write_all(b"\n")?;
            state.lines_written += 1;
        }
        Ok(())
    }

    /// Flushes buffered output to disk.
    pub fn flush(&self) -> Result<()> {
        self.lock()?.writer.flush()?;
        Ok(())
    }

    /// Number of lines written so far.
    pub fn lines_written(&self) -> Result<u64> {
        Ok(self.lock()?.lines_written)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, SinkState>> {
        self.inner
            .lock()
            .map_err(|_| FonError::Internal("LineSink mutex poisoned".into()))
    }
}
