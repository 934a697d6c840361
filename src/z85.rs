//! Base-85 binary-to-text codec used for raw payloads.
//!
//! Maps 4 input bytes to 5 printable ASCII characters (25% overhead versus
//! 33% for Base64). Inputs whose length is not a multiple of 4 are zero
//! padded into a final full block and the encoding gains a single trailing
//! marker digit (`'1'`, `'2'` or `'3'`) recording how many padding bytes to
//! strip on decode.
//!
//! The alphabet contains the digits `1`..`3` themselves, so a trailing
//! marker is only recognized when the total length is congruent to 1 mod 5;
//! marker-free encodings are always a whole number of 5-char groups. This
//! keeps `decode(encode(b)) == b` for every byte sequence.

use crate::error::{FonError, Result};

/// Z85 alphabet: 85 printable ASCII characters, index 0 through 84.
const ENCODE: &[u8; 85] =
    b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ.-:+=^!/*?&<>()[]{}@%$#";

/// Decode table mapping ASCII 32..=127 to alphabet indices. 255 = invalid.
const DECODE: [u8; 96] = [
    255, 68, 255, 84, 83, 82, 72, 255, 75, 76, 70, 65, 255, 63, 62, 69, // 32-47
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 64, 255, 73, 66, 74, 71, // 48-63
    81, 36, 37, 38, 39, 40, 41, 42, 43, 44, 45, 46, 47, 48, 49, 50, // 64-79
    51, 52, 53, 54, 55, 56, 57, 58, 59, 60, 61, 77, 255, 78, 67, 255, // 80-95
    255, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, // 96-111
    25, 26, 27, 28, 29, 30, 31, 32, 33, 34, 35, 79, 255, 80, 255, 255, // 112-127
];

/// Writes one 32-bit group as 5 base-85 digits, most significant first.
fn push_group(out: &mut String, mut value: u32) {
    let mut digits = [0u8; 5];
    for slot in digits.iter_mut().rev() {
        *slot = ENCODE[(value % 85) as usize];
        value /= 85;
    }
    for d in digits {
        out.push(d as char);
    }
}

/// Encodes a byte slice into its Z85 text form.
///
/// The output length is `ceil(len/4) * 5`, plus one marker character when
/// `len` is not a multiple of 4. An empty input produces an empty string.
pub fn encode(data: &[u8]) -> String {
    if data.is_empty() {
        return String::new();
    }

    let padding = (4 - data.len() % 4) % 4;
    let mut out = String::with_capacity((data.len() + padding) / 4 * 5 + usize::from(padding > 0));

    let mut chunks = data.chunks_exact(4);
    for block in &mut chunks {
        let value = u32::from_be_bytes([block[0], block[1], block[2], block[3]]);
        push_group(&mut out, value);
    }

    let tail = chunks.remainder();
    if !tail.is_empty() {
        // Shift the remaining bytes into the high end, zero-fill the rest.
        let mut value: u32 = 0;
        for &b in tail {
            value = (value << 8) | u32::from(b);
        }
        value <<= 8 * padding;
        push_group(&mut out, value);
        out.push((b'0' + padding as u8) as char);
    }

    out
}

/// Decodes a Z85 text form back into bytes.
///
/// # Errors
///
/// Returns [`FonError::InvalidZ85`] for characters outside the alphabet, a
/// payload that is not a whole number of 5-char groups, a group exceeding
/// 32 bits, or a padding marker with no payload in front of it.
pub fn decode(encoded: &str) -> Result<Vec<u8>> {
    let bytes = encoded.as_bytes();
    if bytes.is_empty() {
        return Ok(Vec::new());
    }

    // A padding marker exists iff the length is one past a group boundary.
    let mut len = bytes.len();
    let mut padding = 0usize;
    if len % 5 == 1 {
        let last = bytes[len - 1];
        if !(b'1'..=b'3').contains(&last) {
            return Err(FonError::InvalidZ85(format!(
                "expected padding marker, found {:?}",
                last as char
            )));
        }
        padding = usize::from(last - b'0');
        len -= 1;
    }

    if len % 5 != 0 {
        return Err(FonError::InvalidZ85(format!(
            "payload length {len} is not a multiple of 5"
        )));
    }
    if len == 0 {
        return Err(FonError::InvalidZ85("padding marker without payload".into()));
    }

    let out_len = len / 5 * 4 - padding;
    let mut out = Vec::with_capacity(out_len);

    for group in bytes[..len].chunks_exact(5) {
        let mut value: u64 = 0;
        for &c in group {
            if !(32..=127).contains(&c) {
                return Err(FonError::InvalidZ85(format!(
                    "byte 0x{c:02X} outside printable ASCII"
                )));
            }
            let digit = DECODE[(c - 32) as usize];
            if digit == 255 {
                return Err(FonError::InvalidZ85(format!(
                    "character {:?} outside the alphabet",
                    c as char
                )));
            }
            value = value * 85 + u64::from(digit);
        }
        if value > u64::from(u32::MAX) {
            return Err(FonError::InvalidZ85("group exceeds 32 bits".into()));
        }

        for byte in (value as u32).to_be_bytes() {
            if out.len() < out_len {
                out.push(byte);
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_round_trips() {
        assert_eq!(encode(&[]), "");
        assert_eq!(decode("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn all_padding_cases_round_trip() {
        for len in [1usize, 2, 3, 4, 5, 7, 8] {
            let data: Vec<u8> = (0..len as u8).map(|i| i.wrapping_mul(37)).collect();
            let text = encode(&data);
            let expected_len = data.len().div_ceil(4) * 5 + usize::from(data.len() % 4 != 0);
            assert_eq!(text.len(), expected_len, "length for input of {len} bytes");
            assert_eq!(decode(&text).unwrap(), data);
        }
    }

    #[test]
    fn marker_digit_matches_padding() {
        let text = encode(&[0x00, 0x01, 0x02, 0x03, 0xFF, 0xFE, 0xFD]);
        assert_eq!(text.len(), 11);
        assert!(text.ends_with('1'));
    }

    #[test]
    fn full_block_ending_in_marker_digit_survives() {
        // Encodes to a group whose last base-85 digit is '1'. The length
        // check must keep it from being eaten as a padding marker.
        let data = [0, 0, 0, 1];
        let text = encode(&data);
        assert_eq!(text, "00001");
        assert_eq!(decode(&text).unwrap(), data);
    }

    #[test]
    fn known_vector() {
        // The canonical ZeroMQ "HelloWorld" test frame.
        let data = [0x86, 0x4F, 0xD2, 0x6F, 0xB5, 0x59, 0xF7, 0x5B];
        assert_eq!(encode(&data), "HelloWorld");
    }

    #[test]
    fn rejects_bad_characters() {
        assert!(matches!(decode("abcd\u{7f}"), Err(FonError::InvalidZ85(_))));
        assert!(matches!(decode("ab\"de"), Err(FonError::InvalidZ85(_))));
    }

    #[test]
    fn rejects_ragged_lengths() {
        assert!(matches!(decode("abcdef"), Err(FonError::InvalidZ85(_))));
        assert!(matches!(decode("abcd"), Err(FonError::InvalidZ85(_))));
    }

    #[test]
    fn rejects_lonely_marker() {
        assert!(matches!(decode("2"), Err(FonError::InvalidZ85(_))));
    }

    #[test]
    fn rejects_overflowing_group() {
        // "#####" is the maximum digit five times, well above 2^32.
        assert!(matches!(decode("#####"), Err(FonError::InvalidZ85(_))));
    }
}
