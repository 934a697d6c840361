//! Property-based tests for the core round-trip guarantees.
//!
//! These complement the integration tests by checking the invariants over
//! generated inputs: line round-trips, file round-trips and the Z85 length
//! formula.

#![allow(missing_docs)]

use proptest::prelude::*;
use tempfile::tempdir;

use fon::{Fon, FonDump, RawBlob, Record, Value};

/// A generated key: non-empty, whitelist characters only.
fn key_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_-]{1,12}"
}

/// One generated value of any representable shape.
fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<u8>().prop_map(Value::Byte),
        any::<i16>().prop_map(Value::Short),
        any::<i32>().prop_map(Value::Int),
        any::<u32>().prop_map(Value::UInt),
        any::<i64>().prop_map(Value::Long),
        any::<u64>().prop_map(Value::ULong),
        // NaN breaks equality on purpose; keep floats finite here.
        prop::num::f32::NORMAL.prop_map(Value::Float),
        prop::num::f64::NORMAL.prop_map(Value::Double),
        any::<bool>().prop_map(Value::Bool),
        ".*".prop_map(Value::Str),
        prop::collection::vec(any::<u8>(), 0..48)
            .prop_map(|b| Value::Raw(RawBlob::from_bytes(b))),
        prop::collection::vec(any::<i32>(), 0..16).prop_map(Value::IntArray),
        prop::collection::vec(any::<f64>().prop_filter("finite", |f| f.is_finite()), 0..16)
            .prop_map(Value::DoubleArray),
        prop::collection::vec(any::<bool>(), 0..16).prop_map(Value::BoolArray),
        prop::collection::vec(".*", 0..8).prop_map(Value::StrArray),
    ]
}

fn record_strategy() -> impl Strategy<Value = Record> {
    prop::collection::btree_map(key_strategy(), value_strategy(), 0..8).prop_map(|fields| {
        let mut record = Record::new();
        for (key, value) in fields {
            record.insert(key, value).expect("generated keys are unique and valid");
        }
        record
    })
}

proptest! {
    /// parse(serialize(record)) == record for every representable record.
    #[test]
    fn prop_record_round_trip(record in record_strategy()) {
        let line = Fon::serialize_line(&record);
        let parsed = Fon::parse_line(&line).expect("serializer output must parse");
        prop_assert_eq!(parsed, record);
    }

    /// Z85 round-trips every byte sequence and obeys the length formula.
    #[test]
    fn prop_z85_round_trip(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let text = fon::z85::encode(&data);
        let expected =
            data.len().div_ceil(4) * 5 + usize::from(data.len() % 4 != 0);
        prop_assert_eq!(text.len(), expected);
        prop_assert_eq!(fon::z85::decode(&text).expect("own encoding"), data);
    }

    /// deserialize(serialize(dump)) == dump for dense dumps.
    #[test]
    fn prop_file_round_trip(records in prop::collection::vec(record_strategy(), 0..12)) {
        // Dense indices, non-empty records only: empty records would
        // produce blank lines, which read back as holes. Sparse index
        // survival is covered by the integration tests.
        let mut dump = FonDump::new();
        for record in records.into_iter().filter(|r| !r.is_empty()) {
            let index = dump.len() as u64;
            dump.insert(index, record).expect("unique index");
        }

        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("prop.fon");
        Fon::save(&dump, &path).expect("save");
        let loaded = Fon::load(&path).expect("load");
        prop_assert_eq!(loaded, dump);
    }
}
