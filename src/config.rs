//! Process-wide tunables, read at call time.
//!
//! The knobs live in atomics rather than a mutable singleton so parallel
//! callers and parallel test runners observe coherent values. Thresholds
//! are tunables, not constants: the right values depend on I/O topology
//! and core count.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

static EAGER_UNPACK_RAW: AtomicBool = AtomicBool::new(false);
static PARALLEL_METHOD_THRESHOLD: AtomicUsize = AtomicUsize::new(2000);
static WHOLE_FILE_THRESHOLD: AtomicU64 = AtomicU64::new(500 * 1024 * 1024);
static READ_CHUNK_LINES: AtomicUsize = AtomicUsize::new(10_000);

/// Whether the parser Z85-decodes raw payloads during parse. Default false:
/// blobs stay packed until [`unpack`](crate::RawBlob::unpack) is called.
pub fn eager_unpack_raw() -> bool {
    EAGER_UNPACK_RAW.load(Ordering::Relaxed)
}

/// Sets [`eager_unpack_raw`].
pub fn set_eager_unpack_raw(enabled: bool) {
    EAGER_UNPACK_RAW.store(enabled, Ordering::Relaxed);
}

/// Record-count boundary of the auto write chooser: at or below it the
/// pipelined strategy runs, above it the chunked strategy. Default 2000.
pub fn parallel_method_threshold() -> usize {
    PARALLEL_METHOD_THRESHOLD.load(Ordering::Relaxed)
}

/// Sets [`parallel_method_threshold`].
pub fn set_parallel_method_threshold(records: usize) {
    PARALLEL_METHOD_THRESHOLD.store(records, Ordering::Relaxed);
}

/// File-size boundary of the auto read chooser: below it the whole file is
/// buffered (or mapped) at once, above it reading is chunked. Default
/// 500 MiB.
pub fn whole_file_threshold() -> u64 {
    WHOLE_FILE_THRESHOLD.load(Ordering::Relaxed)
}

/// Sets [`whole_file_threshold`].
pub fn set_whole_file_threshold(bytes: u64) {
    WHOLE_FILE_THRESHOLD.store(bytes, Ordering::Relaxed);
}

/// Batch size, in lines, of the chunked reader. Bounds peak memory at
/// roughly `chunk * average line length`. Default 10 000.
pub fn read_chunk_lines() -> usize {
    READ_CHUNK_LINES.load(Ordering::Relaxed)
}

/// Sets [`read_chunk_lines`].
pub fn set_read_chunk_lines(lines: usize) {
    READ_CHUNK_LINES.store(lines.max(1), Ordering::Relaxed);
}
