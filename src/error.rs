//! Centralized error handling for FON.
//!
//! All failure conditions are surfaced as [`FonError`] values; the crate
//! contains no panicking paths (enforced by `#![deny(clippy::panic)]` and
//! `#![deny(clippy::unwrap_used)]`).
//!
//! ## Design
//!
//! 1. **No Panics:** every fallible operation returns [`Result`].
//! 2. **Cloneable Errors:** [`FonError`] is `Clone` so the first error raised
//!    inside a parallel worker can be captured and re-raised by the calling
//!    thread after the pool drains. I/O errors are wrapped in `Arc` to keep
//!    cloning cheap.
//! 3. **Positions:** parser errors carry the byte offset into the line where
//!    the problem was detected.
//!
//! ## Example
//!
//! ```rust
//! use fon::{Fon, FonError};
//!
//! match Fon::parse_line("broken line") {
//!     Ok(record) => println!("{} fields", record.len()),
//!     Err(FonError::InvalidFormat { pos, msg }) => {
//!         eprintln!("bad input at byte {pos}: {msg}")
//!     }
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```

use std::fmt;
use std::io;
use std::sync::Arc;

use crate::value::ScalarKind;

/// A specialized `Result` type for FON operations.
pub type Result<T> = std::result::Result<T, FonError>;

/// The master error enum covering all failure domains in FON.
///
/// Parser variants (`InvalidFormat`, `UnknownKind`, `NumericParse`) are fatal
/// for the line that raised them; store variants (`DuplicateKey`,
/// `DuplicateIndex`) are fatal for the single insertion and leave the target
/// unchanged. When a parallel worker fails, the whole file operation fails
/// with the first captured error.
#[derive(Debug, Clone)]
pub enum FonError {
    /// A key contains a byte outside `[A-Za-z0-9_-]`, or is empty.
    InvalidKey(String),

    /// The line does not follow the `key=T:value` grammar. Carries the byte
    /// offset into the line where the violation was detected.
    InvalidFormat {
        /// Byte offset into the input line.
        pos: usize,
        /// Description of the violation.
        msg: String,
    },

    /// The type tag is not one of the eleven known kind characters.
    UnknownKind(char),

    /// A numeric lexeme failed to parse into its declared type (bad digit,
    /// overflow, empty lexeme).
    NumericParse {
        /// Byte offset of the lexeme within the input line.
        pos: usize,
        /// The offending lexeme.
        lexeme: String,
        /// The declared target kind.
        kind: ScalarKind,
    },

    /// A Z85 payload is malformed: a character outside the alphabet, a
    /// length that is not a whole number of groups, or a group that
    /// overflows 32 bits.
    InvalidZ85(String),

    /// The key already exists in the record.
    DuplicateKey(String),

    /// The line index already exists in the dump.
    DuplicateIndex(u64),

    /// A typed lookup found a value of a different kind.
    KindMismatch {
        /// The kind the caller asked for.
        expected: ScalarKind,
        /// The kind actually stored.
        found: ScalarKind,
    },

    /// Low-level I/O failure. Wrapped in `Arc` to keep the error `Clone`.
    Io(Arc<io::Error>),

    /// Logic error in the pipeline (mutex poisoning, thread-pool
    /// construction). Should not occur in production.
    Internal(String),
}

impl fmt::Display for FonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidKey(key) => write!(
                f,
                "Invalid key {key:?}: keys must be non-empty and drawn from [A-Za-z0-9_-]"
            ),
            Self::InvalidFormat { pos, msg } => write!(f, "Invalid format at byte {pos}: {msg}"),
            Self::UnknownKind(tag) => write!(f, "Unknown type tag {tag:?}"),
            Self::NumericParse { pos, lexeme, kind } => {
                write!(f, "Failed to parse {lexeme:?} as {kind:?} at byte {pos}")
            }
            Self::InvalidZ85(msg) => write!(f, "Invalid Z85 payload: {msg}"),
            Self::DuplicateKey(key) => write!(f, "Duplicate key {key:?}"),
            Self::DuplicateIndex(index) => write!(f, "Duplicate line index {index}"),
            Self::KindMismatch { expected, found } => {
                write!(f, "Kind mismatch: expected {expected:?}, found {found:?}")
            }
            Self::Io(e) => write!(f, "I/O Error: {e}"),
            Self::Internal(s) => write!(f, "Internal Logic Error: {s}"),
        }
    }
}

impl std::error::Error for FonError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for FonError {
    fn from(err: io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}
