//! The write pipeline: a [`FonDump`] to LF-terminated file lines.
//!
//! Output order is always ascending line index; within a line, field order
//! is the record's insertion order. Three strategies trade memory for
//! overlap:
//!
//! - **Fanout**: serialize every record in parallel into an
//!   index-partitioned result array, then stream it out in order. Fastest
//!   when everything fits in memory.
//! - **Chunked**: partition the ordered snapshot, parallel-serialize one
//!   chunk, write it, move on. Bounds memory to one chunk and overlaps
//!   serialization with writing.
//! - **Pipelined**: a producer pool fills an order-aware slot buffer; the
//!   calling thread is the single consumer, draining slots in strictly
//!   ascending position and blocking until the next position lands. Every
//!   position is produced exactly once, so the drain always makes progress.
//!
//! The auto chooser picks pipelined at or below
//! [`config::parallel_method_threshold`] records and chunked above it.

use std::path::Path;
#[cfg(feature = "parallel")]
use std::sync::{Condvar, Mutex};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config;
use crate::error::Result;
#[cfg(feature = "parallel")]
use crate::error::FonError;
use crate::io::LineSink;
use crate::record::{FonDump, Record};
use crate::ser::serialize_record;

/// How a dump is turned into file lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteStrategy {
    /// Pick by record count against the configured threshold.
    #[default]
    Auto,
    /// Serialize everything in parallel, then write in order.
    Fanout,
    /// Serialize and write one bounded chunk at a time.
    Chunked,
    /// Producer pool plus a strictly-ordered single consumer.
    Pipelined,
}

/// Writes `dump` to `path` with the given strategy.
pub fn write_dump(dump: &FonDump, path: &Path, strategy: WriteStrategy) -> Result<()> {
    match strategy {
        WriteStrategy::Auto => {
            if dump.len() <= config::parallel_method_threshold() {
                write_pipelined(dump, path)
            } else {
                write_chunked(dump, path, None)
            }
        }
        WriteStrategy::Fanout => write_fanout(dump, path),
        WriteStrategy::Chunked => write_chunked(dump, path, None),
        WriteStrategy::Pipelined => write_pipelined(dump, path),
    }
}

fn snapshot(dump: &FonDump) -> Vec<&Record> {
    dump.iter().map(|(_, record)| record).collect()
}

/// Fanout strategy: one parallel pass, one ordered writing pass.
pub fn write_fanout(dump: &FonDump, path: &Path) -> Result<()> {
    let entries = snapshot(dump);

    #[cfg(feature = "parallel")]
    let lines: Vec<String> = entries.par_iter().map(|r| serialize_record(r)).collect();
    #[cfg(not(feature = "parallel"))]
    let lines: Vec<String> = entries.iter().map(|r| serialize_record(r)).collect();

    let sink = LineSink::create(path)?;
    sink.write_lines(lines.iter().map(String::as_str))?;
    sink.flush()
}

/// Chunk size heuristic: small enough to overlap with writing, large
/// enough to amortize the fan-out.
fn chunk_size_for(count: usize) -> usize {
    #[cfg(feature = "parallel")]
    let workers = rayon::current_num_threads();
    #[cfg(not(feature = "parallel"))]
    let workers = 1;

    (count / (workers * 4).max(50)).clamp(500, 2000)
}

/// Chunked strategy: bounded-memory batches, written as they complete.
pub fn write_chunked(dump: &FonDump, path: &Path, chunk_size: Option<usize>) -> Result<()> {
    let entries = snapshot(dump);
    let chunk_size = chunk_size.unwrap_or_else(|| chunk_size_for(entries.len())).max(1);

    let sink = LineSink::create(path)?;
    for chunk in entries.chunks(chunk_size) {
        #[cfg(feature = "parallel")]
        let lines: Vec<String> = chunk.par_iter().map(|r| serialize_record(r)).collect();
        #[cfg(not(feature = "parallel"))]
        let lines: Vec<String> = chunk.iter().map(|r| serialize_record(r)).collect();

        sink.write_lines(lines.iter().map(String::as_str))?;
    }
    sink.flush()
}

/// Pipelined strategy: producers fill position slots, the calling thread
/// drains them in order, blocking until the next slot is ready.
#[cfg(feature = "parallel")]
pub fn write_pipelined(dump: &FonDump, path: &Path) -> Result<()> {
    let entries = snapshot(dump);
    let sink = LineSink::create(path)?;

    // A lone worker cannot produce behind a blocked consumer; write
    // sequentially instead of parking the only thread on the condvar.
    if rayon::current_num_threads() <= 1 {
        for record in &entries {
            sink.write_line(&serialize_record(record))?;
        }
        return sink.flush();
    }

    let slots: Mutex<Vec<Option<String>>> = Mutex::new(vec![None; entries.len()]);
    let ready = Condvar::new();
    let mut outcome: Result<()> = Ok(());

    rayon::scope(|s| {
        for (position, record) in entries.iter().enumerate() {
            let slots = &slots;
            let ready = &ready;
            s.spawn(move |_| {
                let line = serialize_record(record);
                let mut guard = slots.lock().unwrap_or_else(|p| p.into_inner());
                guard[position] = Some(line);
                ready.notify_all();
            });
        }

        // Single consumer on the calling thread: advance only when the
        // next required position is present.
        outcome = (|| {
            let mut next = 0usize;
            let mut guard = slots
                .lock()
                .map_err(|_| FonError::Internal("slot buffer mutex poisoned".into()))?;
            while next < entries.len() {
                if let Some(line) = guard[next].take() {
                    drop(guard);
                    sink.write_line(&line)?;
                    next += 1;
                    guard = slots
                        .lock()
                        .map_err(|_| FonError::Internal("slot buffer mutex poisoned".into()))?;
                } else {
                    guard = ready
                        .wait(guard)
                        .map_err(|_| FonError::Internal("slot buffer mutex poisoned".into()))?;
                }
            }
            Ok(())
        })();
    });

    outcome?;
    sink.flush()
}

/// Degraded single-threaded mode: ordered serialize-and-write loop.
#[cfg(not(feature = "parallel"))]
pub fn write_pipelined(dump: &FonDump, path: &Path) -> Result<()> {
    let sink = LineSink::create(path)?;
    for (_, record) in dump.iter() {
        sink.write_line(&serialize_record(record))?;
    }
    sink.flush()
}
