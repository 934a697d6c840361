//! The read pipeline: file bytes to a populated [`FonDump`].
//!
//! Two strategies, chosen by file size:
//!
//! - **Whole-file** (below [`config::whole_file_threshold`]): the file is
//!   memory-mapped (or buffered when the `mmap` feature is off), split into
//!   line slices that alias the buffer, and the non-blank lines are fanned
//!   out across the worker pool. Each worker parses its lines; the results
//!   are committed to the dump in a single-threaded phase, each at its
//!   original line index.
//! - **Chunked** (at or above the threshold): lines are streamed and
//!   batched; each full batch is parsed in parallel and committed before
//!   the next is read, bounding peak memory to one batch.
//!
//! Line indices count every physical line, blank ones included, so blank
//! lines leave holes in the dump. `CRLF` is accepted as a terminator on
//! read; a CR not followed by LF is data.
//!
//! The first worker error aborts the whole operation; completion order of
//! the workers never affects the index a record lands at.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;

#[cfg(not(all(feature = "mmap", not(target_arch = "wasm32"))))]
use std::io::Read;

#[cfg(all(feature = "mmap", not(target_arch = "wasm32")))]
use memmap2::Mmap;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config;
use crate::error::{FonError, Result};
use crate::parse::parse_line;
use crate::record::{FonDump, Record};

/// The backing bytes of a whole-file read.
#[derive(Debug, Clone)]
pub enum DataSource {
    /// Memory-mapped file contents.
    #[cfg(all(feature = "mmap", not(target_arch = "wasm32")))]
    Mmap(Arc<Mmap>),
    /// Heap-buffered file contents.
    Memory(Arc<Vec<u8>>),
}

impl DataSource {
    /// Opens `path` as a read-only byte source.
    pub fn open(path: &Path) -> Result<Self> {
        #[cfg(all(feature = "mmap", not(target_arch = "wasm32")))]
        {
            let file = File::open(path)?;
            // Safety: the mapping is read-only and the file is assumed to
            // stay unmodified for the duration of the read.
            #[allow(unsafe_code)]
            let mmap = unsafe { Mmap::map(&file)? };
            Ok(Self::Mmap(Arc::new(mmap)))
        }
        #[cfg(not(all(feature = "mmap", not(target_arch = "wasm32"))))]
        {
            let mut buf = Vec::new();
            File::open(path)?.read_to_end(&mut buf)?;
            Ok(Self::Memory(Arc::new(buf)))
        }
    }
}

impl Deref for DataSource {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &Self::Target {
        match self {
            #[cfg(all(feature = "mmap", not(target_arch = "wasm32")))]
            Self::Mmap(mmap) => mmap.as_ref(),
            Self::Memory(vec) => vec.as_slice(),
        }
    }
}

/// Splits a buffer into one sub-slice per physical line, blanks included.
///
/// LF terminates a line; a CR immediately before the LF belongs to the
/// terminator. A final line without a terminator is kept; a trailing LF
/// does not open an extra blank line.
pub fn split_lines(data: &[u8]) -> Vec<&[u8]> {
    let mut lines = Vec::with_capacity(data.len() / 40 + 1);
    let mut start = 0usize;
    for (i, &b) in data.iter().enumerate() {
        if b == b'\n' {
            let mut end = i;
            if end > start && data[end - 1] == b'\r' {
                end -= 1;
            }
            lines.push(&data[start..end]);
            start = i + 1;
        }
    }
    if start < data.len() {
        lines.push(&data[start..]);
    }
    lines
}

fn parse_indexed_line(index: u64, bytes: &[u8]) -> Result<(u64, Record)> {
    let text = std::str::from_utf8(bytes).map_err(|e| FonError::InvalidFormat {
        pos: e.valid_up_to(),
        msg: format!("line {index} is not valid UTF-8"),
    })?;
    Ok((index, parse_line(text)?))
}

/// Parses a batch of `(line index, line bytes)` pairs, fanning the work
/// across the current pool. The first error fails the batch.
fn parse_batch(batch: &[(u64, &[u8])]) -> Result<Vec<(u64, Record)>> {
    #[cfg(feature = "parallel")]
    {
        batch
            .par_iter()
            .map(|&(index, bytes)| parse_indexed_line(index, bytes))
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        batch
            .iter()
            .map(|&(index, bytes)| parse_indexed_line(index, bytes))
            .collect()
    }
}

fn commit(dump: &mut FonDump, parsed: Vec<(u64, Record)>) -> Result<()> {
    for (index, record) in parsed {
        // A non-blank line can still parse to zero fields (e.g. a lone
        // carriage return); those leave holes like blank lines do.
        if !record.is_empty() {
            dump.insert(index, record)?;
        }
    }
    Ok(())
}

/// Reads a file with the strategy picked by its size.
pub fn read_dump(path: &Path) -> Result<FonDump> {
    let size = std::fs::metadata(path)?.len();
    if size < config::whole_file_threshold() {
        read_dump_whole(path)
    } else {
        read_dump_chunked(path, config::read_chunk_lines())
    }
}

/// Whole-file strategy: one buffer, line slices aliasing it, one fan-out.
pub fn read_dump_whole(path: &Path) -> Result<FonDump> {
    let source = DataSource::open(path)?;
    let lines = split_lines(&source);

    let indexed: Vec<(u64, &[u8])> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| !line.is_empty())
        .map(|(i, line)| (i as u64, *line))
        .collect();

    let parsed = parse_batch(&indexed)?;
    let mut dump = FonDump::new();
    commit(&mut dump, parsed)?;
    Ok(dump)
}

/// Chunked strategy: stream lines, parse in batches of `chunk_lines`.
pub fn read_dump_chunked(path: &Path, chunk_lines: usize) -> Result<FonDump> {
    let chunk_lines = chunk_lines.max(1);
    let mut reader = BufReader::new(File::open(path)?);
    let mut dump = FonDump::new();

    let mut batch: Vec<(u64, String)> = Vec::with_capacity(chunk_lines);
    let mut line_index: u64 = 0;
    let mut buf = String::new();

    loop {
        buf.clear();
        if reader.read_line(&mut buf)? == 0 {
            break;
        }
        if buf.ends_with('\n') {
            buf.pop();
            if buf.ends_with('\r') {
                buf.pop();
            }
        }
        if !buf.is_empty() {
            batch.push((line_index, std::mem::take(&mut buf)));
        }
        line_index += 1;

        if batch.len() == chunk_lines {
            flush_batch(&mut dump, &batch)?;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        flush_batch(&mut dump, &batch)?;
    }
    Ok(dump)
}

fn flush_batch(dump: &mut FonDump, batch: &[(u64, String)]) -> Result<()> {
    let borrowed: Vec<(u64, &[u8])> = batch
        .iter()
        .map(|(index, line)| (*index, line.as_bytes()))
        .collect();
    let parsed = parse_batch(&borrowed)?;
    commit(dump, parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_keeps_blank_lines_and_drops_trailing_terminator() {
        let lines = split_lines(b"a=i:1\n\nb=i:2\n");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], b"a=i:1");
        assert_eq!(lines[1], b"");
        assert_eq!(lines[2], b"b=i:2");
    }

    #[test]
    fn split_handles_crlf() {
        let lines = split_lines(b"a=i:1\r\nb=i:2\r\n");
        assert_eq!(lines, [&b"a=i:1"[..], &b"b=i:2"[..]]);
    }

    #[test]
    fn split_keeps_final_unterminated_line() {
        let lines = split_lines(b"a=i:1\nb=i:2");
        assert_eq!(lines, [&b"a=i:1"[..], &b"b=i:2"[..]]);
    }

    #[test]
    fn split_lone_cr_is_data() {
        let lines = split_lines(b"a\rb\nc\n");
        assert_eq!(lines, [&b"a\rb"[..], &b"c"[..]]);
    }

    #[test]
    fn split_empty_input() {
        assert!(split_lines(b"").is_empty());
    }
}
