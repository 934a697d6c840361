//! Records and the line-indexed record store.
//!
//! A [`Record`] is an insertion-ordered mapping from validated keys to typed
//! values; serialization walks the fields in the order they were inserted,
//! which for parsed lines is the order they appeared on the wire.
//!
//! A [`FonDump`] maps 64-bit line indices to records. The index is the
//! 0-based position of the record's line in its file, blank lines included,
//! so a dump may contain holes. Iteration is always ascending by index.

use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::error::{FonError, Result};
use crate::value::{Value, validate_key};

/// One line's worth of data: an ordered list of `key = value` fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: IndexMap<String, Value>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty record sized for `capacity` fields.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: IndexMap::with_capacity(capacity),
        }
    }

    /// Inserts a field at the end of the record.
    ///
    /// # Errors
    ///
    /// [`FonError::InvalidKey`] when the key is empty or contains a byte
    /// outside `[A-Za-z0-9_-]`; [`FonError::DuplicateKey`] when the key is
    /// already present. Neither failure mutates the record.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        let key = key.into();
        validate_key(&key)?;
        if self.fields.contains_key(&key) {
            return Err(FonError::DuplicateKey(key));
        }
        self.fields.insert(key, value.into());
        Ok(())
    }

    /// Returns the value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// True when `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the record has no fields. Empty records serialize to an
    /// empty line.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Mutable access to a stored value (for in-place blob packing).
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.fields.get_mut(key)
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a str, &'a Value);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a Value)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// An in-memory file: records keyed by their 0-based line index.
///
/// Holes are legal (blank lines leave them behind) and produce no output on
/// write; emission is dense over the records that exist.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FonDump {
    records: BTreeMap<u64, Record>,
}

impl FonDump {
    /// Creates an empty dump.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record at `index`.
    ///
    /// # Errors
    ///
    /// [`FonError::DuplicateIndex`] when the slot is occupied; the incumbent
    /// record is left untouched.
    pub fn insert(&mut self, index: u64, record: Record) -> Result<()> {
        if self.try_insert(index, record) {
            Ok(())
        } else {
            Err(FonError::DuplicateIndex(index))
        }
    }

    /// Insert-if-absent. Returns `false` without clobbering the incumbent
    /// when the slot is occupied.
    pub fn try_insert(&mut self, index: u64, record: Record) -> bool {
        match self.records.entry(index) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
            std::collections::btree_map::Entry::Occupied(_) => false,
        }
    }

    /// Returns the record at `index`, if present.
    pub fn get(&self, index: u64) -> Option<&Record> {
        self.records.get(&index)
    }

    /// Mutable access to the record at `index`.
    pub fn get_mut(&mut self, index: u64) -> Option<&mut Record> {
        self.records.get_mut(&index)
    }

    /// True when `index` is populated.
    pub fn contains(&self, index: u64) -> bool {
        self.records.contains_key(&index)
    }

    /// Number of populated indices.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no index is populated.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates `(index, record)` pairs in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &Record)> {
        self.records.iter().map(|(i, r)| (*i, r))
    }

    /// Removes and returns the record at `index`.
    pub fn remove(&mut self, index: u64) -> Option<Record> {
        self.records.remove(&index)
    }
}

impl<'a> IntoIterator for &'a FonDump {
    type Item = (u64, &'a Record);
    type IntoIter = Box<dyn Iterator<Item = (u64, &'a Record)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
