//! The FON value model: scalar kinds, the tagged value union and raw blobs.
//!
//! A value is either one of eleven scalar kinds or a homogeneous array of
//! one of the ten non-raw kinds. Each kind owns a single wire tag character;
//! the tag appears once per field (`key=T:payload`), never per element.

use std::borrow::Cow;

use crate::error::{FonError, Result};
use crate::z85;

/// The closed set of scalar kinds, each with its 1-char wire tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// `e`: unsigned 8-bit integer.
    Byte,
    /// `t`: signed 16-bit integer.
    Short,
    /// `i`: signed 32-bit integer.
    Int,
    /// `u`: unsigned 32-bit integer.
    UInt,
    /// `l`: signed 64-bit integer.
    Long,
    /// `g`: unsigned 64-bit integer.
    ULong,
    /// `f`: IEEE-754 binary32.
    Float,
    /// `d`: IEEE-754 binary64.
    Double,
    /// `b`: boolean, serialized as `1`/`0`.
    Bool,
    /// `s`: UTF-8 text string.
    Str,
    /// `r`: opaque binary blob, Z85-encoded on the wire.
    Raw,
}

impl ScalarKind {
    /// Returns the wire tag character for this kind.
    pub fn tag(self) -> char {
        match self {
            Self::Byte => 'e',
            Self::Short => 't',
            Self::Int => 'i',
            Self::UInt => 'u',
            Self::Long => 'l',
            Self::ULong => 'g',
            Self::Float => 'f',
            Self::Double => 'd',
            Self::Bool => 'b',
            Self::Str => 's',
            Self::Raw => 'r',
        }
    }

    /// Maps a wire tag byte back to its kind. Returns `None` for any byte
    /// outside the eleven known tags.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            b'e' => Some(Self::Byte),
            b't' => Some(Self::Short),
            b'i' => Some(Self::Int),
            b'u' => Some(Self::UInt),
            b'l' => Some(Self::Long),
            b'g' => Some(Self::ULong),
            b'f' => Some(Self::Float),
            b'd' => Some(Self::Double),
            b'b' => Some(Self::Bool),
            b's' => Some(Self::Str),
            b'r' => Some(Self::Raw),
            _ => None,
        }
    }
}

/// Validates a field key against the 64-character whitelist `[A-Za-z0-9_-]`.
///
/// Runs in O(len). Empty keys are rejected.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty()
        || !key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
    {
        return Err(FonError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// An opaque binary payload that on the wire is Z85 text.
///
/// At rest the blob holds exactly one representation: raw bytes, encoded
/// text, or nothing. [`pack`](Self::pack) and [`unpack`](Self::unpack) move
/// between the two populated states and are no-ops on their own target
/// state; neither transition loses the value, only the alternate form.
#[derive(Debug, Clone, Default)]
pub enum RawBlob {
    /// No payload. Serializes as `""`.
    #[default]
    Empty,
    /// Z85 text form.
    Packed(String),
    /// Raw byte form.
    Unpacked(Vec<u8>),
}

impl RawBlob {
    /// Creates a blob holding raw bytes. An empty input yields `Empty`.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        if data.is_empty() {
            Self::Empty
        } else {
            Self::Unpacked(data)
        }
    }

    /// Creates a blob holding already-encoded Z85 text. An empty input
    /// yields `Empty`. The text is not validated until unpacked.
    pub fn from_encoded(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            Self::Empty
        } else {
            Self::Packed(text)
        }
    }

    /// Moves bytes into the encoded text form. Idempotent on `Packed` and
    /// `Empty`.
    pub fn pack(&mut self) -> &mut Self {
        if let Self::Unpacked(data) = self {
            let encoded = z85::encode(data);
            *self = Self::Packed(encoded);
        }
        self
    }

    /// Moves encoded text into the raw byte form. Idempotent on `Unpacked`
    /// and `Empty`.
    ///
    /// # Errors
    ///
    /// Returns [`FonError::InvalidZ85`] when the stored text is not valid
    /// Z85; the blob is left untouched in that case.
    pub fn unpack(&mut self) -> Result<&mut Self> {
        if let Self::Packed(text) = self {
            let data = z85::decode(text)?;
            *self = Self::from_bytes(data);
        }
        Ok(self)
    }

    /// True when the blob currently holds encoded text.
    pub fn is_packed(&self) -> bool {
        matches!(self, Self::Packed(_))
    }

    /// True when the blob currently holds raw bytes.
    pub fn is_unpacked(&self) -> bool {
        matches!(self, Self::Unpacked(_))
    }

    /// True when the blob holds nothing.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// The raw bytes, if currently unpacked.
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Unpacked(data) => Some(data),
            _ => None,
        }
    }

    /// The encoded text, if currently packed.
    pub fn encoded_text(&self) -> Option<&str> {
        match self {
            Self::Packed(text) => Some(text),
            _ => None,
        }
    }

    /// The wire form of this blob, computed without mutating it. Packed
    /// blobs borrow their text; unpacked blobs encode on the fly.
    pub fn encoded(&self) -> Cow<'_, str> {
        match self {
            Self::Empty => Cow::Borrowed(""),
            Self::Packed(text) => Cow::Borrowed(text),
            Self::Unpacked(data) => Cow::Owned(z85::encode(data)),
        }
    }
}

/// Packed and unpacked blobs carrying the same payload compare equal; the
/// representation is transport state, not identity.
impl PartialEq for RawBlob {
    fn eq(&self, other: &Self) -> bool {
        self.encoded() == other.encoded()
    }
}

/// A single typed FON value: one scalar, or a homogeneous array.
///
/// Arrays exist for every kind except [`ScalarKind::Raw`]; a raw array is a
/// kind error in the format and is unrepresentable here.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `e` scalar.
    Byte(u8),
    /// `t` scalar.
    Short(i16),
    /// `i` scalar.
    Int(i32),
    /// `u` scalar.
    UInt(u32),
    /// `l` scalar.
    Long(i64),
    /// `g` scalar.
    ULong(u64),
    /// `f` scalar.
    Float(f32),
    /// `d` scalar.
    Double(f64),
    /// `b` scalar.
    Bool(bool),
    /// `s` scalar.
    Str(String),
    /// `r` scalar.
    Raw(RawBlob),
    /// `e` array.
    ByteArray(Vec<u8>),
    /// `t` array.
    ShortArray(Vec<i16>),
    /// `i` array.
    IntArray(Vec<i32>),
    /// `u` array.
    UIntArray(Vec<u32>),
    /// `l` array.
    LongArray(Vec<i64>),
    /// `g` array.
    ULongArray(Vec<u64>),
    /// `f` array.
    FloatArray(Vec<f32>),
    /// `d` array.
    DoubleArray(Vec<f64>),
    /// `b` array.
    BoolArray(Vec<bool>),
    /// `s` array.
    StrArray(Vec<String>),
}

impl Value {
    /// The scalar kind of this value; for arrays, the element kind.
    pub fn kind(&self) -> ScalarKind {
        match self {
            Self::Byte(_) | Self::ByteArray(_) => ScalarKind::Byte,
            Self::Short(_) | Self::ShortArray(_) => ScalarKind::Short,
            Self::Int(_) | Self::IntArray(_) => ScalarKind::Int,
            Self::UInt(_) | Self::UIntArray(_) => ScalarKind::UInt,
            Self::Long(_) | Self::LongArray(_) => ScalarKind::Long,
            Self::ULong(_) | Self::ULongArray(_) => ScalarKind::ULong,
            Self::Float(_) | Self::FloatArray(_) => ScalarKind::Float,
            Self::Double(_) | Self::DoubleArray(_) => ScalarKind::Double,
            Self::Bool(_) | Self::BoolArray(_) => ScalarKind::Bool,
            Self::Str(_) | Self::StrArray(_) => ScalarKind::Str,
            Self::Raw(_) => ScalarKind::Raw,
        }
    }

    /// True for the array variants.
    pub fn is_array(&self) -> bool {
        matches!(
            self,
            Self::ByteArray(_)
                | Self::ShortArray(_)
                | Self::IntArray(_)
                | Self::UIntArray(_)
                | Self::LongArray(_)
                | Self::ULongArray(_)
                | Self::FloatArray(_)
                | Self::DoubleArray(_)
                | Self::BoolArray(_)
                | Self::StrArray(_)
        )
    }

    fn mismatch(&self, expected: ScalarKind) -> FonError {
        FonError::KindMismatch {
            expected,
            found: self.kind(),
        }
    }
}

macro_rules! impl_scalar_accessors {
    ($(($method:ident, $variant:ident, $ty:ty, $kind:ident)),* $(,)?) => {
        impl Value {
            $(
                /// Typed scalar view. Fails with a kind mismatch when the
                /// stored value differs.
                pub fn $method(&self) -> Result<$ty> {
                    match self {
                        Self::$variant(v) => Ok(*v),
                        other => Err(other.mismatch(ScalarKind::$kind)),
                    }
                }
            )*
        }
    };
}

macro_rules! impl_array_accessors {
    ($(($method:ident, $variant:ident, $ty:ty, $kind:ident)),* $(,)?) => {
        impl Value {
            $(
                /// Typed array view. Fails with a kind mismatch when the
                /// stored value differs.
                pub fn $method(&self) -> Result<&[$ty]> {
                    match self {
                        Self::$variant(v) => Ok(v),
                        other => Err(other.mismatch(ScalarKind::$kind)),
                    }
                }
            )*
        }
    };
}

impl_scalar_accessors!(
    (as_byte, Byte, u8, Byte),
    (as_short, Short, i16, Short),
    (as_int, Int, i32, Int),
    (as_uint, UInt, u32, UInt),
    (as_long, Long, i64, Long),
    (as_ulong, ULong, u64, ULong),
    (as_float, Float, f32, Float),
    (as_double, Double, f64, Double),
    (as_bool, Bool, bool, Bool),
);

impl_array_accessors!(
    (as_byte_array, ByteArray, u8, Byte),
    (as_short_array, ShortArray, i16, Short),
    (as_int_array, IntArray, i32, Int),
    (as_uint_array, UIntArray, u32, UInt),
    (as_long_array, LongArray, i64, Long),
    (as_ulong_array, ULongArray, u64, ULong),
    (as_float_array, FloatArray, f32, Float),
    (as_double_array, DoubleArray, f64, Double),
    (as_bool_array, BoolArray, bool, Bool),
);

impl Value {
    /// Typed string view.
    pub fn as_str(&self) -> Result<&str> {
        match self {
            Self::Str(s) => Ok(s),
            other => Err(other.mismatch(ScalarKind::Str)),
        }
    }

    /// Typed string-array view.
    pub fn as_str_array(&self) -> Result<&[String]> {
        match self {
            Self::StrArray(v) => Ok(v),
            other => Err(other.mismatch(ScalarKind::Str)),
        }
    }

    /// Typed raw-blob view.
    pub fn as_raw(&self) -> Result<&RawBlob> {
        match self {
            Self::Raw(blob) => Ok(blob),
            other => Err(other.mismatch(ScalarKind::Raw)),
        }
    }

    /// Mutable raw-blob view, for in-place pack/unpack.
    pub fn as_raw_mut(&mut self) -> Result<&mut RawBlob> {
        match self {
            Self::Raw(blob) => Ok(blob),
            other => Err(other.mismatch(ScalarKind::Raw)),
        }
    }
}

macro_rules! impl_value_from {
    ($(($ty:ty, $variant:ident)),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

impl_value_from!(
    (u8, Byte),
    (i16, Short),
    (i32, Int),
    (u32, UInt),
    (i64, Long),
    (u64, ULong),
    (f32, Float),
    (f64, Double),
    (bool, Bool),
    (String, Str),
    (RawBlob, Raw),
    (Vec<u8>, ByteArray),
    (Vec<i16>, ShortArray),
    (Vec<i32>, IntArray),
    (Vec<u32>, UIntArray),
    (Vec<i64>, LongArray),
    (Vec<u64>, ULongArray),
    (Vec<f32>, FloatArray),
    (Vec<f64>, DoubleArray),
    (Vec<bool>, BoolArray),
    (Vec<String>, StrArray),
);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_round_trip_is_total() {
        for kind in [
            ScalarKind::Byte,
            ScalarKind::Short,
            ScalarKind::Int,
            ScalarKind::UInt,
            ScalarKind::Long,
            ScalarKind::ULong,
            ScalarKind::Float,
            ScalarKind::Double,
            ScalarKind::Bool,
            ScalarKind::Str,
            ScalarKind::Raw,
        ] {
            assert_eq!(ScalarKind::from_tag(kind.tag() as u8), Some(kind));
        }
        assert_eq!(ScalarKind::from_tag(b'x'), None);
        assert_eq!(ScalarKind::from_tag(b'['), None);
    }

    #[test]
    fn key_whitelist() {
        assert!(validate_key("snake_case-09AZ").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("has space").is_err());
        assert!(validate_key("dotted.key").is_err());
        assert!(validate_key("uni\u{e9}").is_err());
    }

    #[test]
    fn blob_state_machine() {
        let mut blob = RawBlob::from_bytes(vec![1, 2, 3, 4, 5]);
        assert!(blob.is_unpacked());

        blob.pack();
        assert!(blob.is_packed());
        let text = blob.encoded_text().unwrap().to_string();

        // pack is idempotent
        blob.pack();
        assert_eq!(blob.encoded_text(), Some(text.as_str()));

        blob.unpack().unwrap();
        assert_eq!(blob.bytes(), Some(&[1u8, 2, 3, 4, 5][..]));

        // unpack is idempotent
        blob.unpack().unwrap();
        assert!(blob.is_unpacked());
    }

    #[test]
    fn blob_empty_is_stable() {
        let mut blob = RawBlob::Empty;
        blob.pack();
        assert!(blob.is_empty());
        blob.unpack().unwrap();
        assert!(blob.is_empty());
        assert_eq!(blob.encoded(), "");
    }

    #[test]
    fn blob_unpack_failure_preserves_state() {
        let mut blob = RawBlob::from_encoded("not z85 \u{1F980}");
        assert!(blob.unpack().is_err());
        assert!(blob.is_packed());
    }

    #[test]
    fn blob_representations_compare_equal() {
        let unpacked = RawBlob::from_bytes(vec![9, 8, 7]);
        let mut packed = unpacked.clone();
        packed.pack();
        assert_eq!(unpacked, packed);
    }

    #[test]
    fn typed_views_check_kind() {
        let v = Value::Int(7);
        assert_eq!(v.as_int().unwrap(), 7);
        let err = v.as_long().unwrap_err();
        assert!(matches!(
            err,
            FonError::KindMismatch {
                expected: ScalarKind::Long,
                found: ScalarKind::Int,
            }
        ));

        let arr = Value::from(vec![1i32, 2, 3]);
        assert_eq!(arr.as_int_array().unwrap(), &[1, 2, 3]);
        assert!(arr.as_int().is_err());
        assert!(arr.is_array());
        assert_eq!(arr.kind(), ScalarKind::Int);
    }
}
