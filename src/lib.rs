//! # FON
//!
//! A line-oriented, typed key/value serialization format and its parallel
//! codec. A file is a sequence of records, one per line; each record is an
//! ordered list of typed fields:
//!
//! ```text
//! id=i:42,name=s:"test",price=f:99.99,active=b:1,tags=s:["a","b"]
//! ```
//!
//! The format targets high-throughput persistence of many independent
//! records (bulk export/import, offline snapshots), not nested object
//! graphs. Because every record occupies exactly one line, a file
//! decomposes into independently parseable units that can be fanned out
//! across worker threads in both directions while the 1:1 mapping between
//! line index and record identity is preserved.
//!
//! ## Key Features
//!
//! *   **Eleven scalar kinds** with 1-char wire tags, plus homogeneous
//!     arrays of each (except raw blobs): `e t i u l g f d b s r`.
//! *   **Parallel Reads:** files below a size threshold are memory-mapped,
//!     split into line slices and parsed across Rayon workers; larger files
//!     stream through bounded batches.
//! *   **Parallel Writes:** three strategies (fanout, chunked, pipelined)
//!     that all produce byte-identical output in ascending line-index
//!     order.
//! *   **Z85 blobs:** opaque binary payloads travel as Base-85 text with a
//!     single padding-marker digit, 25% overhead versus 33% for Base64.
//! *   **Allocation-aware parsing:** numeric lexemes parse straight from
//!     the input slice and escape-free strings copy verbatim.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fon::{Fon, FonDump, Record};
//!
//! let mut record = Record::new();
//! record.insert("id", 7i32)?;
//! record.insert("name", "first")?;
//!
//! let mut dump = FonDump::new();
//! dump.insert(0, record)?;
//!
//! Fon::save(&dump, "snapshot.fon")?;
//! let restored = Fon::load("snapshot.fon")?;
//! assert_eq!(restored.len(), 1);
//! # Ok::<(), fon::FonError>(())
//! ```
//!
//! ## Concurrency Model
//!
//! Worker fan-out over preemptive OS threads; parallelism defaults to the
//! hardware thread count and is overridable per call through
//! [`Fon::builder`]. Building without the `parallel` feature yields a
//! correct single-threaded codec. Records always land at their original
//! line index regardless of worker completion order, and no two workers
//! ever touch the same index slot.
//!
//! ## Safety and Error Handling
//!
//! * `unsafe` appears exactly once, mapping the input file, and the crate
//!   otherwise denies it.
//! * No `unwrap()` or `panic!()` in library code (enforced by clippy
//!   lints).
//! * Every failure is a [`FonError`] with a kind, a message and, for
//!   parser errors, the byte position.

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::panic))]

// --- PUBLIC API MODULES ---
pub mod api;
pub mod config;
pub mod error;
pub mod record;
pub mod value;
pub mod z85;

// --- INTERNAL IMPLEMENTATION MODULES (Hidden from Docs) ---
#[doc(hidden)]
pub mod io;
#[doc(hidden)]
pub mod parse;
#[doc(hidden)]
pub mod reader;
#[doc(hidden)]
pub mod ser;
#[doc(hidden)]
pub mod writer;

// --- RE-EXPORTS ---

pub use api::{Fon, FonOptions};
pub use error::{FonError, Result};
pub use record::{FonDump, Record};
pub use value::{RawBlob, ScalarKind, Value};
pub use writer::WriteStrategy;
