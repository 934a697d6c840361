//! The single-line serializer, symmetric with the parser.
//!
//! Emits `key=T:payload` fields joined by commas, in record insertion
//! order. Numeric formatting goes through the standard formatter, which is
//! locale-free and, for floats, shortest-round-trip: the emitted digits are
//! the fewest that parse back to the identical binary value.

use std::fmt::Write;

use crate::record::Record;
use crate::value::Value;

/// Serializes a record to its wire form, without a trailing newline.
///
/// An empty record produces an empty string. The output is ASCII except
/// inside string lexemes, where UTF-8 passes through untouched.
pub fn serialize_record(record: &Record) -> String {
    let mut out = String::with_capacity(64 * record.len().max(1));
    for (i, (key, value)) in record.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(key);
        out.push('=');
        out.push(value.kind().tag());
        out.push(':');
        serialize_value(&mut out, value);
    }
    out
}

fn serialize_value(out: &mut String, value: &Value) {
    match value {
        Value::Byte(v) => push_display(out, v),
        Value::Short(v) => push_display(out, v),
        Value::Int(v) => push_display(out, v),
        Value::UInt(v) => push_display(out, v),
        Value::Long(v) => push_display(out, v),
        Value::ULong(v) => push_display(out, v),
        Value::Float(v) => push_display(out, v),
        Value::Double(v) => push_display(out, v),
        Value::Bool(v) => out.push(if *v { '1' } else { '0' }),
        Value::Str(v) => serialize_string(out, v),
        Value::Raw(blob) => {
            out.push('"');
            out.push_str(&blob.encoded());
            out.push('"');
        }
        Value::ByteArray(v) => serialize_numeric_array(out, v),
        Value::ShortArray(v) => serialize_numeric_array(out, v),
        Value::IntArray(v) => serialize_numeric_array(out, v),
        Value::UIntArray(v) => serialize_numeric_array(out, v),
        Value::LongArray(v) => serialize_numeric_array(out, v),
        Value::ULongArray(v) => serialize_numeric_array(out, v),
        Value::FloatArray(v) => serialize_numeric_array(out, v),
        Value::DoubleArray(v) => serialize_numeric_array(out, v),
        Value::BoolArray(v) => {
            out.push('[');
            for (i, b) in v.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push(if *b { '1' } else { '0' });
            }
            out.push(']');
        }
        Value::StrArray(v) => {
            out.push('[');
            for (i, s) in v.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                serialize_string(out, s);
            }
            out.push(']');
        }
    }
}

fn push_display<T: std::fmt::Display>(out: &mut String, value: &T) {
    // Formatting into a String cannot fail.
    let _ = write!(out, "{value}");
}

fn serialize_numeric_array<T: std::fmt::Display>(out: &mut String, values: &[T]) {
    out.push('[');
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_display(out, v);
    }
    out.push(']');
}

fn serialize_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{C}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
