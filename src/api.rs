//! The public entry points: four file operations and the two in-memory
//! line operations, plus an options builder for per-call tuning.

use std::path::Path;

use crate::error::Result;
use crate::record::{FonDump, Record};
use crate::writer::WriteStrategy;
use crate::{parse, reader, ser, writer};

#[cfg(feature = "parallel")]
use crate::error::FonError;

/// Per-call tuning for the file operations.
///
/// ```rust,no_run
/// use fon::{Fon, FonDump, WriteStrategy};
///
/// let dump = FonDump::new();
/// Fon::builder()
///     .parallelism(4)
///     .strategy(WriteStrategy::Chunked)
///     .save(&dump, "snapshot.fon")?;
/// # Ok::<(), fon::FonError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FonOptions {
    parallelism: Option<usize>,
    strategy: WriteStrategy,
    write_chunk_size: Option<usize>,
    read_chunk_lines: Option<usize>,
}

impl FonOptions {
    /// Caps the worker count for this call. Defaults to the number of
    /// hardware threads.
    pub fn parallelism(mut self, workers: usize) -> Self {
        self.parallelism = Some(workers);
        self
    }

    /// Selects the write strategy. Defaults to [`WriteStrategy::Auto`].
    pub fn strategy(mut self, strategy: WriteStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Records per batch for the chunked writer. Defaults to a heuristic
    /// from record count and worker count.
    pub fn chunk_size(mut self, records: usize) -> Self {
        self.write_chunk_size = Some(records);
        self
    }

    /// Lines per batch for the chunked reader. Defaults to the process-wide
    /// [`config`](crate::config) setting.
    pub fn chunk_lines(mut self, lines: usize) -> Self {
        self.read_chunk_lines = Some(lines);
        self
    }

    /// Writes `dump` to `path` under these options.
    pub fn save(&self, dump: &FonDump, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let strategy = self.strategy;
        let chunk = self.write_chunk_size;
        with_pool(self.parallelism, || match (strategy, chunk) {
            // An explicit chunk size forces the chunked writer.
            (WriteStrategy::Auto | WriteStrategy::Chunked, Some(size)) => {
                writer::write_chunked(dump, path, Some(size))
            }
            (s, _) => writer::write_dump(dump, path, s),
        })
    }

    /// Reads `path` into a dump under these options.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<FonDump> {
        let path = path.as_ref();
        let chunk = self.read_chunk_lines;
        with_pool(self.parallelism, || match chunk {
            Some(lines) => reader::read_dump_chunked(path, lines),
            None => reader::read_dump(path),
        })
    }
}

/// FON serializer/deserializer with parallel processing support.
///
/// All operations are synchronous-completion: they finish or fail as a
/// whole, and the first worker error becomes the operation's error.
#[derive(Debug, Default)]
pub struct Fon;

impl Fon {
    /// Starts an options builder for tuned calls.
    pub fn builder() -> FonOptions {
        FonOptions::default()
    }

    /// Writes the dump to a file, choosing the write strategy from the
    /// record count.
    pub fn save(dump: &FonDump, path: impl AsRef<Path>) -> Result<()> {
        FonOptions::default().save(dump, path)
    }

    /// Writes the dump with the bounded-memory chunked strategy.
    pub fn save_chunked(
        dump: &FonDump,
        path: impl AsRef<Path>,
        chunk_size: usize,
    ) -> Result<()> {
        FonOptions::default()
            .strategy(WriteStrategy::Chunked)
            .chunk_size(chunk_size)
            .save(dump, path)
    }

    /// Reads a file into a dump, choosing the read strategy from the file
    /// size.
    pub fn load(path: impl AsRef<Path>) -> Result<FonDump> {
        FonOptions::default().load(path)
    }

    /// Reads a file with the bounded-memory chunked strategy.
    pub fn load_chunked(path: impl AsRef<Path>, chunk_lines: usize) -> Result<FonDump> {
        FonOptions::default().chunk_lines(chunk_lines).load(path)
    }

    /// Serializes one record to its wire line, without a newline.
    pub fn serialize_line(record: &Record) -> String {
        ser::serialize_record(record)
    }

    /// Parses one wire line (no trailing newline) into a record.
    pub fn parse_line(line: &str) -> Result<Record> {
        parse::parse_line(line)
    }
}

/// Runs `op` inside a pool of the requested size, or on the default global
/// pool when no override is given.
#[cfg(feature = "parallel")]
fn with_pool<T: Send>(
    parallelism: Option<usize>,
    op: impl FnOnce() -> Result<T> + Send,
) -> Result<T> {
    match parallelism {
        Some(workers) if workers > 0 => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()
                .map_err(|e| FonError::Internal(format!("thread pool construction: {e}")))?;
            pool.install(op)
        }
        _ => op(),
    }
}

#[cfg(not(feature = "parallel"))]
fn with_pool<T>(_parallelism: Option<usize>, op: impl FnOnce() -> Result<T>) -> Result<T> {
    op()
}
