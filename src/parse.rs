//! The single-line parser.
//!
//! Turns one record's wire form (no trailing newline) back into an ordered
//! [`Record`]. The parser is a hand-rolled cursor loop over the byte slice:
//! find `=`, validate the key, read the `T:` tag pair, then dispatch to the
//! scalar or array sub-parser, each of which reports how many bytes it
//! consumed (excluding any trailing comma, which the caller swallows).
//!
//! The hot path performs no per-field heap allocation beyond the value
//! itself: numeric lexemes parse straight from the input slice and quoted
//! strings copy verbatim unless an escape is present.

use std::str::FromStr;

use crate::config;
use crate::error::{FonError, Result};
use crate::record::Record;
use crate::value::{RawBlob, ScalarKind, Value};

/// Parses one line into a record.
///
/// An empty slice yields an empty record. A trailing comma is tolerated.
/// Whitespace is not part of the grammar; spaces are data and will usually
/// surface as a numeric or key error.
///
/// # Errors
///
/// Any grammar violation is fatal for the whole line: missing `=` or `:`,
/// an unknown tag, an unterminated quote, an unmatched `]`, a numeric
/// lexeme that does not fit its declared type, or a duplicate/invalid key.
pub fn parse_line(line: &str) -> Result<Record> {
    let bytes = line.as_bytes();
    let mut record = Record::new();
    let mut pos = 0usize;

    while pos < bytes.len() {
        let eq = bytes[pos..]
            .iter()
            .position(|&b| b == b'=')
            .map(|off| pos + off)
            .ok_or_else(|| FonError::InvalidFormat {
                pos,
                msg: "expected '=' after key".into(),
            })?;
        let key = &line[pos..eq];
        pos = eq + 1;

        if pos + 1 >= bytes.len() || bytes[pos + 1] != b':' {
            return Err(FonError::InvalidFormat {
                pos,
                msg: "expected type tag followed by ':'".into(),
            });
        }
        let kind =
            ScalarKind::from_tag(bytes[pos]).ok_or(FonError::UnknownKind(bytes[pos] as char))?;
        pos += 2;

        let (value, consumed) = if bytes.get(pos) == Some(&b'[') {
            parse_array(line, pos, kind)?
        } else {
            parse_scalar(line, pos, kind)?
        };

        record.insert(key, value)?;
        pos += consumed;

        if bytes.get(pos) == Some(&b',') {
            pos += 1;
        } else {
            break;
        }
    }

    Ok(record)
}

/// Byte offset of the first value terminator (`,`, `]`, CR, LF) at or after
/// `start`, or the end of the slice.
fn find_value_end(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|&b| matches!(b, b',' | b']' | b'\r' | b'\n'))
        .map_or(bytes.len(), |off| start + off)
}

/// True when the quote at `at` is a lexeme delimiter: the run of
/// backslashes immediately before it (within the lexeme) has even length.
fn quote_is_delimiter(bytes: &[u8], lexeme_start: usize, at: usize) -> bool {
    let mut run = 0usize;
    let mut i = at;
    while i > lexeme_start && bytes[i - 1] == b'\\' {
        run += 1;
        i -= 1;
    }
    run % 2 == 0
}

/// Parses a quoted lexeme starting at `start`. Returns the unescaped
/// content and the bytes consumed, including both quotes.
fn parse_quoted(line: &str, start: usize) -> Result<(String, usize)> {
    let bytes = line.as_bytes();
    if bytes.get(start) != Some(&b'"') {
        return Err(FonError::InvalidFormat {
            pos: start,
            msg: "expected opening '\"'".into(),
        });
    }

    let lexeme_start = start + 1;
    let mut end = lexeme_start;
    loop {
        match bytes[end..].iter().position(|&b| b == b'"') {
            Some(off) => {
                let candidate = end + off;
                if quote_is_delimiter(bytes, lexeme_start, candidate) {
                    end = candidate;
                    break;
                }
                end = candidate + 1;
            }
            None => {
                return Err(FonError::InvalidFormat {
                    pos: start,
                    msg: "unterminated string".into(),
                });
            }
        }
    }

    let lexeme = &line[lexeme_start..end];
    let consumed = end - start + 1;

    // Fast path: nothing to expand.
    if !lexeme.as_bytes().contains(&b'\\') {
        return Ok((lexeme.to_string(), consumed));
    }

    let mut out = String::with_capacity(lexeme.len());
    unescape_into(lexeme, &mut out);
    Ok((out, consumed))
}

/// Expands escape sequences into `out`. Two-byte escapes cover the seven
/// table entries plus `\/`; `\uXXXX` carries one code point as four hex
/// digits; any other `\x` degrades to the literal `x`.
fn unescape_into(lexeme: &str, out: &mut String) {
    let mut rest = lexeme;
    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + 1..];
        match tail.chars().next() {
            Some('"') => {
                out.push('"');
                rest = &tail[1..];
            }
            Some('\\') => {
                out.push('\\');
                rest = &tail[1..];
            }
            Some('n') => {
                out.push('\n');
                rest = &tail[1..];
            }
            Some('r') => {
                out.push('\r');
                rest = &tail[1..];
            }
            Some('t') => {
                out.push('\t');
                rest = &tail[1..];
            }
            Some('b') => {
                out.push('\u{8}');
                rest = &tail[1..];
            }
            Some('f') => {
                out.push('\u{C}');
                rest = &tail[1..];
            }
            Some('/') => {
                out.push('/');
                rest = &tail[1..];
            }
            Some('u') => match decode_u_escape(tail) {
                Some(c) => {
                    out.push(c);
                    rest = &tail[5..];
                }
                None => {
                    out.push('u');
                    rest = &tail[1..];
                }
            },
            // Unknown escapes degrade to the escaped character.
            Some(other) => {
                out.push(other);
                rest = &tail[other.len_utf8()..];
            }
            None => {
                out.push('\\');
                rest = "";
            }
        }
    }
    out.push_str(rest);
}

/// Reads the `XXXX` of a `\uXXXX` escape from `tail` (which starts at the
/// `u`). Returns `None`, leaving the escape to lenient handling, when the
/// digits are missing, non-hex, or name a surrogate.
fn decode_u_escape(tail: &str) -> Option<char> {
    let hex = tail.get(1..5)?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    char::from_u32(u32::from_str_radix(hex, 16).ok()?)
}

fn parse_numeric<T: FromStr>(line: &str, start: usize, kind: ScalarKind) -> Result<(T, usize)> {
    let end = find_value_end(line.as_bytes(), start);
    let lexeme = &line[start..end];
    let value = lexeme.parse::<T>().map_err(|_| FonError::NumericParse {
        pos: start,
        lexeme: lexeme.to_string(),
        kind,
    })?;
    Ok((value, end - start))
}

fn parse_bool(line: &str, start: usize) -> Result<(bool, usize)> {
    let end = find_value_end(line.as_bytes(), start);
    if end == start {
        return Err(FonError::InvalidFormat {
            pos: start,
            msg: "empty boolean".into(),
        });
    }
    Ok((line.as_bytes()[start] != b'0', end - start))
}

/// Parses one scalar payload of the given kind starting at `start`.
fn parse_scalar(line: &str, start: usize, kind: ScalarKind) -> Result<(Value, usize)> {
    match kind {
        ScalarKind::Byte => {
            parse_numeric::<u8>(line, start, kind).map(|(v, n)| (Value::Byte(v), n))
        }
        ScalarKind::Short => {
            parse_numeric::<i16>(line, start, kind).map(|(v, n)| (Value::Short(v), n))
        }
        ScalarKind::Int => parse_numeric::<i32>(line, start, kind).map(|(v, n)| (Value::Int(v), n)),
        ScalarKind::UInt => {
            parse_numeric::<u32>(line, start, kind).map(|(v, n)| (Value::UInt(v), n))
        }
        ScalarKind::Long => {
            parse_numeric::<i64>(line, start, kind).map(|(v, n)| (Value::Long(v), n))
        }
        ScalarKind::ULong => {
            parse_numeric::<u64>(line, start, kind).map(|(v, n)| (Value::ULong(v), n))
        }
        ScalarKind::Float => {
            parse_numeric::<f32>(line, start, kind).map(|(v, n)| (Value::Float(v), n))
        }
        ScalarKind::Double => {
            parse_numeric::<f64>(line, start, kind).map(|(v, n)| (Value::Double(v), n))
        }
        ScalarKind::Bool => parse_bool(line, start).map(|(v, n)| (Value::Bool(v), n)),
        ScalarKind::Str => parse_quoted(line, start).map(|(v, n)| (Value::Str(v), n)),
        ScalarKind::Raw => {
            let (lexeme, consumed) = parse_quoted(line, start)?;
            let mut blob = RawBlob::from_encoded(lexeme);
            if config::eager_unpack_raw() {
                blob.unpack()?;
            }
            Ok((Value::Raw(blob), consumed))
        }
    }
}

/// Absolute index of the `]` matching the `[` at `start`.
///
/// Depth-counting scan that ignores brackets inside quoted regions; quoted
/// regions open and close on delimiter quotes only (even backslash run).
fn find_closing_bracket(bytes: &[u8], start: usize) -> Result<usize> {
    let mut depth = 0i32;
    let mut in_string = false;
    let mut string_start = 0usize;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if b == b'"' {
            if !in_string {
                in_string = true;
                string_start = i + 1;
            } else if quote_is_delimiter(bytes, string_start, i) {
                in_string = false;
            }
        } else if !in_string {
            if b == b'[' {
                depth += 1;
            } else if b == b']' {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
        }
    }

    Err(FonError::InvalidFormat {
        pos: start,
        msg: "unmatched '['".into(),
    })
}

fn parse_elements<T, F>(line: &str, mut pos: usize, end: usize, parse_one: F) -> Result<Vec<T>>
where
    F: Fn(&str, usize) -> Result<(T, usize)>,
{
    // Pre-size from the span length; 4 bytes per element is the observed
    // ballpark for short numerics.
    let mut out = Vec::with_capacity((end - pos) / 4 + 1);
    while pos < end {
        let (value, consumed) = parse_one(line, pos)?;
        out.push(value);
        pos += consumed;
        if pos < end && line.as_bytes()[pos] == b',' {
            pos += 1;
        }
    }
    Ok(out)
}

/// Parses a bracketed homogeneous array with the given element kind.
fn parse_array(line: &str, start: usize, kind: ScalarKind) -> Result<(Value, usize)> {
    let bytes = line.as_bytes();
    let close = find_closing_bracket(bytes, start)?;
    let inner = start + 1;
    let consumed = close - start + 1;

    let value = match kind {
        ScalarKind::Byte => {
            Value::ByteArray(parse_elements(line, inner, close, |l, p| {
                parse_numeric::<u8>(l, p, kind)
            })?)
        }
        ScalarKind::Short => {
            Value::ShortArray(parse_elements(line, inner, close, |l, p| {
                parse_numeric::<i16>(l, p, kind)
            })?)
        }
        ScalarKind::Int => Value::IntArray(parse_elements(line, inner, close, |l, p| {
            parse_numeric::<i32>(l, p, kind)
        })?),
        ScalarKind::UInt => {
            Value::UIntArray(parse_elements(line, inner, close, |l, p| {
                parse_numeric::<u32>(l, p, kind)
            })?)
        }
        ScalarKind::Long => {
            Value::LongArray(parse_elements(line, inner, close, |l, p| {
                parse_numeric::<i64>(l, p, kind)
            })?)
        }
        ScalarKind::ULong => {
            Value::ULongArray(parse_elements(line, inner, close, |l, p| {
                parse_numeric::<u64>(l, p, kind)
            })?)
        }
        ScalarKind::Float => {
            Value::FloatArray(parse_elements(line, inner, close, |l, p| {
                parse_numeric::<f32>(l, p, kind)
            })?)
        }
        ScalarKind::Double => {
            Value::DoubleArray(parse_elements(line, inner, close, |l, p| {
                parse_numeric::<f64>(l, p, kind)
            })?)
        }
        ScalarKind::Bool => Value::BoolArray(parse_elements(line, inner, close, parse_bool)?),
        ScalarKind::Str => Value::StrArray(parse_elements(line, inner, close, parse_quoted)?),
        ScalarKind::Raw => {
            return Err(FonError::InvalidFormat {
                pos: start,
                msg: "arrays of kind 'r' are not supported".into(),
            });
        }
    };

    Ok((value, consumed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_line_is_empty_record() {
        assert!(parse_line("").unwrap().is_empty());
    }

    #[test]
    fn mixed_scalars() {
        let record = parse_line("id=i:42,name=s:\"test\",price=f:99.99,active=b:1").unwrap();
        assert_eq!(record.len(), 4);
        assert_eq!(record.get("id").unwrap().as_int().unwrap(), 42);
        assert_eq!(record.get("name").unwrap().as_str().unwrap(), "test");
        assert_eq!(record.get("price").unwrap().as_float().unwrap(), 99.99);
        assert!(record.get("active").unwrap().as_bool().unwrap());
    }

    #[test]
    fn field_order_matches_input() {
        let record = parse_line("b=i:1,a=i:2,c=i:3").unwrap();
        let keys: Vec<&str> = record.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["b", "a", "c"]);
    }

    #[test]
    fn arrays() {
        let record =
            parse_line("numbers=i:[1,2,3,4,5],names=s:[\"Alice\",\"Bob\",\"Charlie\"]").unwrap();
        assert_eq!(
            record.get("numbers").unwrap().as_int_array().unwrap(),
            &[1, 2, 3, 4, 5]
        );
        assert_eq!(
            record.get("names").unwrap().as_str_array().unwrap(),
            &["Alice", "Bob", "Charlie"]
        );
    }

    #[test]
    fn empty_arrays_for_every_kind() {
        for tag in ['e', 't', 'i', 'u', 'l', 'g', 'f', 'd', 'b', 's'] {
            let record = parse_line(&format!("k={tag}:[]")).unwrap();
            let value = record.get("k").unwrap();
            assert!(value.is_array(), "tag {tag}");
            assert_eq!(value.kind().tag(), tag);
        }
    }

    #[test]
    fn escapes_expand() {
        let record = parse_line(r#"msg=s:"line\nbreak\ttab \"quoted\" back\\slash""#).unwrap();
        assert_eq!(
            record.get("msg").unwrap().as_str().unwrap(),
            "line\nbreak\ttab \"quoted\" back\\slash"
        );
    }

    #[test]
    fn unknown_escape_degrades_to_literal() {
        let record = parse_line(r#"msg=s:"a\qb""#).unwrap();
        assert_eq!(record.get("msg").unwrap().as_str().unwrap(), "aqb");
    }

    #[test]
    fn u_escape_decodes_four_hex_digits() {
        let record = parse_line(r#"msg=s:"a\u0001b\u001Fc""#).unwrap();
        assert_eq!(
            record.get("msg").unwrap().as_str().unwrap(),
            "a\u{1}b\u{1F}c"
        );
    }

    #[test]
    fn malformed_u_escape_is_lenient() {
        let record = parse_line(r#"msg=s:"a\u00zb""#).unwrap();
        assert_eq!(record.get("msg").unwrap().as_str().unwrap(), "au00zb");
    }

    #[test]
    fn value_ending_in_backslash() {
        // Wire form of the one-char string "\": escaped backslash, then the
        // closing quote. The quote after an even run must terminate.
        let record = parse_line(r#"msg=s:"\\""#).unwrap();
        assert_eq!(record.get("msg").unwrap().as_str().unwrap(), "\\");
    }

    #[test]
    fn brackets_inside_string_elements() {
        let record = parse_line(r#"v=s:["a[b","c]d"]"#).unwrap();
        assert_eq!(
            record.get("v").unwrap().as_str_array().unwrap(),
            &["a[b", "c]d"]
        );
    }

    #[test]
    fn commas_inside_string_elements() {
        let record = parse_line(r#"v=s:["a,b","c"]"#).unwrap();
        assert_eq!(
            record.get("v").unwrap().as_str_array().unwrap(),
            &["a,b", "c"]
        );
    }

    #[test]
    fn trailing_comma_tolerated() {
        let record = parse_line("a=i:1,").unwrap();
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn whitespace_is_data() {
        // The space lands inside the numeric lexeme and kills the parse.
        assert!(matches!(
            parse_line("a=i:1 ,b=i:2"),
            Err(FonError::NumericParse { .. })
        ));
    }

    #[test]
    fn numeric_bounds() {
        assert_eq!(
            parse_line("v=e:255").unwrap().get("v").unwrap().as_byte().unwrap(),
            255
        );
        assert!(matches!(
            parse_line("v=e:256"),
            Err(FonError::NumericParse { .. })
        ));
        assert_eq!(
            parse_line("v=t:-32768").unwrap().get("v").unwrap().as_short().unwrap(),
            i16::MIN
        );
        assert!(matches!(
            parse_line("v=t:-32769"),
            Err(FonError::NumericParse { .. })
        ));
        assert!(matches!(
            parse_line("v=u:-1"),
            Err(FonError::NumericParse { .. })
        ));
        assert_eq!(
            parse_line("v=g:18446744073709551615")
                .unwrap()
                .get("v")
                .unwrap()
                .as_ulong()
                .unwrap(),
            u64::MAX
        );
        assert!(matches!(
            parse_line("v=g:18446744073709551616"),
            Err(FonError::NumericParse { .. })
        ));
    }

    #[test]
    fn format_errors_carry_position() {
        match parse_line("key=i:1,junk") {
            Err(FonError::InvalidFormat { pos, .. }) => assert_eq!(pos, 8),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(
            parse_line("key=x:1"),
            Err(FonError::UnknownKind('x'))
        ));
        assert!(matches!(
            parse_line("key=i"),
            Err(FonError::InvalidFormat { .. })
        ));
        assert!(matches!(
            parse_line(r#"key=s:"open"#),
            Err(FonError::InvalidFormat { .. })
        ));
        assert!(matches!(
            parse_line("key=i:[1,2"),
            Err(FonError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn raw_arrays_rejected() {
        assert!(matches!(
            parse_line("blob=r:[\"abc\"]"),
            Err(FonError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn duplicate_and_invalid_keys_rejected() {
        assert!(matches!(
            parse_line("k=i:1,k=i:2"),
            Err(FonError::DuplicateKey(_))
        ));
        assert!(matches!(
            parse_line("bad key=i:1"),
            Err(FonError::InvalidKey(_))
        ));
    }

    #[test]
    fn raw_stays_packed_by_default() {
        let record = parse_line("blob=r:\"HelloWorld\"").unwrap();
        let blob = record.get("blob").unwrap().as_raw().unwrap();
        assert!(blob.is_packed());
        assert_eq!(blob.encoded_text(), Some("HelloWorld"));
    }

    #[test]
    fn bool_scalar_first_byte_rules() {
        assert!(!parse_line("v=b:0").unwrap().get("v").unwrap().as_bool().unwrap());
        assert!(parse_line("v=b:1").unwrap().get("v").unwrap().as_bool().unwrap());
        // Anything not starting with '0' reads as true.
        assert!(parse_line("v=b:7").unwrap().get("v").unwrap().as_bool().unwrap());
    }
}
