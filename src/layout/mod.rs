//! Declarative binary layouts
//!
//! A [`Layout`] is an ordered list of typed fields. Every wire format in this
//! crate is described as a layout and goes through the same pair of functions,
//! [`serialize`] and [`deserialize`], so there is exactly one encoder and one
//! decoder to get right.
//!
//! # Field kinds
//!
//! - `Uint`: unsigned integer of 1 to 16 bytes, big-endian unless declared
//!   little-endian (only used for mirrored on-chain account layouts)
//! - `Bytes`: fixed-size byte string
//! - `Prefixed`: byte string preceded by a 1, 2 or 4 byte length, optionally
//!   interpreted through a sub-layout supplied by the caller
//! - `Nested`: another layout, serialized inline
//! - `Constant`: fixed bytes such as a discriminator; never part of the value
//! - `Array`: count-prefixed repetition of a sub-layout
//! - `Tail`: all remaining bytes, optionally interpreted through a sub-layout
//!
//! # Example
//!
//! ```rust
//! use ntt_rs::layout::{deserialize, serialize, Layout, LengthPrefix, Record, Value};
//!
//! let layout = Layout::new()
//!     .constant("magic", [0xAA, 0xBB])
//!     .uint("version", 1)
//!     .prefixed("body", LengthPrefix::U16, None);
//!
//! let value: Value = Record::new()
//!     .with("version", 3u8)
//!     .with("body", vec![1u8, 2, 3])
//!     .into();
//!
//! let bytes = serialize(&layout, &value).unwrap();
//! assert_eq!(bytes, vec![0xAA, 0xBB, 0x03, 0x00, 0x03, 1, 2, 3]);
//! assert_eq!(deserialize(&layout, &bytes).unwrap(), value);
//! ```

mod schema;
mod value;

pub use schema::{Payload, Schema};
pub use value::{Record, Value};

use alloy_primitives::{hex, Bytes};
use thiserror::Error;

/// Errors produced by the layout codec.
///
/// Codec errors are deterministic: retrying the same input always fails the
/// same way.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("field `{field}` needs {needed} bytes but only {remaining} remain")]
    ShortBuffer {
        field: &'static str,
        needed: usize,
        remaining: usize,
    },

    #[error("{remaining} trailing bytes left after decoding")]
    TrailingBytes { remaining: usize },

    #[error("field `{field}` expected 0x{expected} but found 0x{found}")]
    DiscriminatorMismatch {
        field: &'static str,
        expected: String,
        found: String,
    },

    #[error("unknown discriminator 0x{0}")]
    UnknownDiscriminator(String),

    #[error("value {value} does not fit the {size} byte field `{field}`")]
    ValueOutOfRange {
        field: &'static str,
        size: usize,
        value: String,
    },

    #[error("field `{field}` expects {expected} bytes, got {actual}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` expected a {expected} value")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
    },

    #[error("invalid value for field `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("unknown layout `{0}`")]
    UnknownLayout(String),

    #[error("invalid layout: {0}")]
    InvalidLayout(String),
}

/// Byte order of an integer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endianness {
    #[default]
    Big,
    Little,
}

/// Width of a length or count prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthPrefix {
    U8,
    U16,
    U32,
}

impl LengthPrefix {
    /// Number of bytes the prefix occupies on the wire.
    pub const fn width(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }

    /// Largest length the prefix can express.
    pub const fn max_len(self) -> usize {
        match self {
            Self::U8 => u8::MAX as usize,
            Self::U16 => u16::MAX as usize,
            Self::U32 => u32::MAX as usize,
        }
    }
}

/// The shape of a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Uint {
        size: usize,
        endianness: Endianness,
    },
    Bytes {
        size: usize,
    },
    Prefixed {
        prefix: LengthPrefix,
        layout: Option<Layout>,
    },
    Nested(Layout),
    Constant(Bytes),
    Array {
        count: LengthPrefix,
        element: Layout,
    },
    Tail {
        layout: Option<Layout>,
    },
}

/// A named field of a [`Layout`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
}

/// An ordered sequence of fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Layout {
    fields: Vec<Field>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    fn push(mut self, name: &'static str, kind: FieldKind) -> Self {
        self.fields.push(Field { name, kind });
        self
    }

    /// Big-endian unsigned integer of `size` bytes.
    pub fn uint(self, name: &'static str, size: usize) -> Self {
        self.push(
            name,
            FieldKind::Uint {
                size,
                endianness: Endianness::Big,
            },
        )
    }

    /// Little-endian unsigned integer of `size` bytes.
    pub fn uint_le(self, name: &'static str, size: usize) -> Self {
        self.push(
            name,
            FieldKind::Uint {
                size,
                endianness: Endianness::Little,
            },
        )
    }

    pub fn bytes(self, name: &'static str, size: usize) -> Self {
        self.push(name, FieldKind::Bytes { size })
    }

    pub fn prefixed(self, name: &'static str, prefix: LengthPrefix, layout: Option<Layout>) -> Self {
        self.push(name, FieldKind::Prefixed { prefix, layout })
    }

    pub fn nested(self, name: &'static str, layout: Layout) -> Self {
        self.push(name, FieldKind::Nested(layout))
    }

    pub fn constant(self, name: &'static str, value: impl Into<Bytes>) -> Self {
        self.push(name, FieldKind::Constant(value.into()))
    }

    pub fn array(self, name: &'static str, count: LengthPrefix, element: Layout) -> Self {
        self.push(name, FieldKind::Array { count, element })
    }

    pub fn tail(self, name: &'static str, layout: Option<Layout>) -> Self {
        self.push(name, FieldKind::Tail { layout })
    }

    /// Supplies a sub-layout for a customizable slot.
    ///
    /// `path` is a dot-separated list of field names; every segment but the
    /// last must name a nested layout or an already customized slot, and the
    /// last must name a `Prefixed` or `Tail` field.
    pub fn customize(mut self, path: &str, sub_layout: Layout) -> Result<Self, LayoutError> {
        self.customize_in_place(path, sub_layout)?;
        Ok(self)
    }

    fn customize_in_place(&mut self, path: &str, sub_layout: Layout) -> Result<(), LayoutError> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };

        let field = self
            .fields
            .iter_mut()
            .find(|field| field.name == head)
            .ok_or_else(|| LayoutError::InvalidLayout(format!("no field named `{head}`")))?;

        match (&mut field.kind, rest) {
            (FieldKind::Prefixed { layout, .. }, None) | (FieldKind::Tail { layout }, None) => {
                *layout = Some(sub_layout);
                Ok(())
            }
            (FieldKind::Nested(inner), Some(rest))
            | (FieldKind::Prefixed { layout: Some(inner), .. }, Some(rest))
            | (FieldKind::Tail { layout: Some(inner) }, Some(rest)) => {
                inner.customize_in_place(rest, sub_layout)
            }
            _ => Err(LayoutError::InvalidLayout(format!(
                "field `{head}` is not a customizable slot"
            ))),
        }
    }

    /// Encoded size when it does not depend on the value.
    ///
    /// Returns `None` for layouts containing prefixed, array or tail fields.
    pub fn fixed_size(&self) -> Option<usize> {
        self.fields.iter().try_fold(0usize, |acc, field| {
            let size = match &field.kind {
                FieldKind::Uint { size, .. } | FieldKind::Bytes { size } => *size,
                FieldKind::Constant(bytes) => bytes.len(),
                FieldKind::Nested(layout) => layout.fixed_size()?,
                FieldKind::Prefixed { .. } | FieldKind::Array { .. } | FieldKind::Tail { .. } => {
                    return None
                }
            };
            Some(acc + size)
        })
    }
}

/// Serializes `value` according to `layout`.
pub fn serialize(layout: &Layout, value: &Value) -> Result<Vec<u8>, LayoutError> {
    let mut out = Vec::with_capacity(layout.fixed_size().unwrap_or(64));
    write_layout(layout, value, "<root>", &mut out)?;
    Ok(out)
}

/// Deserializes `bytes` according to `layout`.
///
/// The whole buffer must be consumed; leftover bytes are an error.
pub fn deserialize(layout: &Layout, bytes: &[u8]) -> Result<Value, LayoutError> {
    let mut reader = Reader::new(bytes);
    let value = read_layout(layout, &mut reader)?;
    reader.finish()?;
    Ok(value)
}

fn write_layout(
    layout: &Layout,
    value: &Value,
    context: &'static str,
    out: &mut Vec<u8>,
) -> Result<(), LayoutError> {
    let record = value.as_record().ok_or(LayoutError::TypeMismatch {
        field: context,
        expected: "record",
    })?;

    for field in &layout.fields {
        write_field(field, record, out)?;
    }
    Ok(())
}

fn write_field(field: &Field, record: &Record, out: &mut Vec<u8>) -> Result<(), LayoutError> {
    let name = field.name;
    match &field.kind {
        FieldKind::Constant(bytes) => out.extend_from_slice(bytes),
        FieldKind::Uint { size, endianness } => {
            write_uint(name, record.uint(name)?, *size, *endianness, out)?;
        }
        FieldKind::Bytes { size } => {
            let bytes = record.bytes(name)?;
            if bytes.len() != *size {
                return Err(LayoutError::LengthMismatch {
                    field: name,
                    expected: *size,
                    actual: bytes.len(),
                });
            }
            out.extend_from_slice(bytes);
        }
        FieldKind::Prefixed { prefix, layout } => {
            let payload = slot_bytes(name, layout.as_ref(), record.get(name)?)?;
            write_length(name, payload.len(), *prefix, out)?;
            out.extend_from_slice(&payload);
        }
        FieldKind::Nested(layout) => write_layout(layout, record.get(name)?, name, out)?,
        FieldKind::Array { count, element } => {
            let items = record.list(name)?;
            write_length(name, items.len(), *count, out)?;
            for item in items {
                write_layout(element, item, name, out)?;
            }
        }
        FieldKind::Tail { layout } => {
            let payload = slot_bytes(name, layout.as_ref(), record.get(name)?)?;
            out.extend_from_slice(&payload);
        }
    }
    Ok(())
}

fn slot_bytes(
    name: &'static str,
    layout: Option<&Layout>,
    value: &Value,
) -> Result<Vec<u8>, LayoutError> {
    match layout {
        Some(layout) => {
            let mut out = Vec::new();
            write_layout(layout, value, name, &mut out)?;
            Ok(out)
        }
        None => value
            .as_bytes()
            .map(|bytes| bytes.to_vec())
            .ok_or(LayoutError::TypeMismatch {
                field: name,
                expected: "bytes",
            }),
    }
}

fn check_uint_size(name: &'static str, size: usize) -> Result<(), LayoutError> {
    if size == 0 || size > 16 {
        return Err(LayoutError::InvalidLayout(format!(
            "integer field `{name}` has unsupported size {size}"
        )));
    }
    Ok(())
}

fn write_uint(
    name: &'static str,
    value: u128,
    size: usize,
    endianness: Endianness,
    out: &mut Vec<u8>,
) -> Result<(), LayoutError> {
    check_uint_size(name, size)?;
    if size < 16 && value >> (size * 8) != 0 {
        return Err(LayoutError::ValueOutOfRange {
            field: name,
            size,
            value: value.to_string(),
        });
    }

    match endianness {
        Endianness::Big => out.extend_from_slice(&value.to_be_bytes()[16 - size..]),
        Endianness::Little => out.extend_from_slice(&value.to_le_bytes()[..size]),
    }
    Ok(())
}

fn write_length(
    name: &'static str,
    len: usize,
    prefix: LengthPrefix,
    out: &mut Vec<u8>,
) -> Result<(), LayoutError> {
    if len > prefix.max_len() {
        return Err(LayoutError::ValueOutOfRange {
            field: name,
            size: prefix.width(),
            value: len.to_string(),
        });
    }
    write_uint(name, len as u128, prefix.width(), Endianness::Big, out)
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, field: &'static str, needed: usize) -> Result<&'a [u8], LayoutError> {
        if needed > self.remaining() {
            return Err(LayoutError::ShortBuffer {
                field,
                needed,
                remaining: self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + needed];
        self.pos += needed;
        Ok(slice)
    }

    fn rest(&mut self) -> &'a [u8] {
        let slice = &self.buf[self.pos..];
        self.pos = self.buf.len();
        slice
    }

    fn finish(&self) -> Result<(), LayoutError> {
        match self.remaining() {
            0 => Ok(()),
            remaining => Err(LayoutError::TrailingBytes { remaining }),
        }
    }
}

fn read_layout(layout: &Layout, reader: &mut Reader<'_>) -> Result<Value, LayoutError> {
    let mut record = Record::new();
    for field in &layout.fields {
        if let Some(value) = read_field(field, reader)? {
            record.insert(field.name, value);
        }
    }
    Ok(Value::Record(record))
}

fn read_field(field: &Field, reader: &mut Reader<'_>) -> Result<Option<Value>, LayoutError> {
    let name = field.name;
    let value = match &field.kind {
        FieldKind::Constant(expected) => {
            let found = reader.take(name, expected.len())?;
            if found != expected.as_ref() {
                return Err(LayoutError::DiscriminatorMismatch {
                    field: name,
                    expected: hex::encode(expected),
                    found: hex::encode(found),
                });
            }
            return Ok(None);
        }
        FieldKind::Uint { size, endianness } => {
            Value::Uint(read_uint(name, reader, *size, *endianness)?)
        }
        FieldKind::Bytes { size } => Value::Bytes(Bytes::copy_from_slice(reader.take(name, *size)?)),
        FieldKind::Prefixed { prefix, layout } => {
            let len = read_uint(name, reader, prefix.width(), Endianness::Big)? as usize;
            let data = reader.take(name, len)?;
            slot_value(layout.as_ref(), data)?
        }
        FieldKind::Nested(layout) => read_layout(layout, reader)?,
        FieldKind::Array { count, element } => {
            let count = read_uint(name, reader, count.width(), Endianness::Big)? as usize;
            let mut items = Vec::with_capacity(count.min(reader.remaining()));
            for _ in 0..count {
                items.push(read_layout(element, reader)?);
            }
            Value::List(items)
        }
        FieldKind::Tail { layout } => slot_value(layout.as_ref(), reader.rest())?,
    };
    Ok(Some(value))
}

fn slot_value(layout: Option<&Layout>, data: &[u8]) -> Result<Value, LayoutError> {
    match layout {
        Some(layout) => deserialize(layout, data),
        None => Ok(Value::Bytes(Bytes::copy_from_slice(data))),
    }
}

fn read_uint(
    name: &'static str,
    reader: &mut Reader<'_>,
    size: usize,
    endianness: Endianness,
) -> Result<u128, LayoutError> {
    check_uint_size(name, size)?;
    let bytes = reader.take(name, size)?;
    let mut buf = [0u8; 16];
    let value = match endianness {
        Endianness::Big => {
            buf[16 - size..].copy_from_slice(bytes);
            u128::from_be_bytes(buf)
        }
        Endianness::Little => {
            buf[..size].copy_from_slice(bytes);
            u128::from_le_bytes(buf)
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn header_layout() -> Layout {
        Layout::new()
            .constant("magic", [0xCA, 0xFE])
            .uint("version", 1)
            .uint("sequence", 8)
            .bytes("emitter", 4)
    }

    fn header_value(version: u8, sequence: u64) -> Value {
        Record::new()
            .with("version", version)
            .with("sequence", sequence)
            .with("emitter", vec![1u8, 2, 3, 4])
            .into()
    }

    #[test]
    fn test_fixed_layout_encoding() {
        let bytes = serialize(&header_layout(), &header_value(1, 0x0102)).unwrap();
        insta::assert_snapshot!(hex::encode(&bytes), @"cafe01000000000000010201020304");
        assert_eq!(header_layout().fixed_size(), Some(bytes.len()));
    }

    #[test]
    fn test_decode_reconstructs_value() {
        let value = header_value(7, u64::MAX);
        let bytes = serialize(&header_layout(), &value).unwrap();
        assert_eq!(deserialize(&header_layout(), &bytes).unwrap(), value);
    }

    #[test]
    fn test_constant_mismatch_rejected() {
        let mut bytes = serialize(&header_layout(), &header_value(1, 1)).unwrap();
        bytes[0] = 0x00;
        let err = deserialize(&header_layout(), &bytes).unwrap_err();
        assert_eq!(
            err,
            LayoutError::DiscriminatorMismatch {
                field: "magic",
                expected: "cafe".to_string(),
                found: "00fe".to_string(),
            }
        );
    }

    #[test]
    fn test_short_buffer_rejected() {
        let bytes = serialize(&header_layout(), &header_value(1, 1)).unwrap();
        let err = deserialize(&header_layout(), &bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(
            err,
            LayoutError::ShortBuffer {
                field: "emitter",
                needed: 4,
                remaining: 3
            }
        ));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = serialize(&header_layout(), &header_value(1, 1)).unwrap();
        bytes.push(0xFF);
        assert_eq!(
            deserialize(&header_layout(), &bytes).unwrap_err(),
            LayoutError::TrailingBytes { remaining: 1 }
        );
    }

    #[rstest]
    #[case(1, 256)]
    #[case(2, 65_536)]
    #[case(4, 1 << 32)]
    fn test_value_exceeding_width_rejected(#[case] size: usize, #[case] value: u128) {
        let layout = Layout::new().uint("n", size);
        let err = serialize(&layout, &Record::new().with("n", value).into()).unwrap_err();
        assert!(matches!(err, LayoutError::ValueOutOfRange { field: "n", .. }));
    }

    #[test]
    fn test_little_endian_integer() {
        let layout = Layout::new().uint_le("limit", 8).uint("be", 2);
        let value: Value = Record::new().with("limit", 1u64).with("be", 1u16).into();
        let bytes = serialize(&layout, &value).unwrap();
        assert_eq!(bytes, vec![1, 0, 0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(deserialize(&layout, &bytes).unwrap(), value);
    }

    #[rstest]
    #[case(LengthPrefix::U8, vec![3])]
    #[case(LengthPrefix::U16, vec![0, 3])]
    #[case(LengthPrefix::U32, vec![0, 0, 0, 3])]
    fn test_length_prefix_widths(#[case] prefix: LengthPrefix, #[case] expected_prefix: Vec<u8>) {
        let layout = Layout::new().prefixed("data", prefix, None);
        let value: Value = Record::new().with("data", vec![9u8, 9, 9]).into();
        let bytes = serialize(&layout, &value).unwrap();
        assert_eq!(&bytes[..prefix.width()], expected_prefix.as_slice());
        assert_eq!(&bytes[prefix.width()..], &[9, 9, 9]);
        assert_eq!(deserialize(&layout, &bytes).unwrap(), value);
    }

    #[test]
    fn test_overlong_length_prefix_rejected() {
        let layout = Layout::new().prefixed("data", LengthPrefix::U16, None);
        let err = deserialize(&layout, &[0x00, 0x05, 1, 2]).unwrap_err();
        assert!(matches!(
            err,
            LayoutError::ShortBuffer {
                field: "data",
                needed: 5,
                remaining: 2
            }
        ));
    }

    #[test]
    fn test_payload_too_long_for_prefix() {
        let layout = Layout::new().prefixed("data", LengthPrefix::U8, None);
        let value: Value = Record::new().with("data", vec![0u8; 256]).into();
        assert!(matches!(
            serialize(&layout, &value).unwrap_err(),
            LayoutError::ValueOutOfRange { field: "data", .. }
        ));
    }

    #[test]
    fn test_customized_slot_decodes_structure() {
        let envelope = Layout::new()
            .uint("kind", 1)
            .prefixed("body", LengthPrefix::U16, None);
        let raw = serialize(
            &envelope,
            &Record::new()
                .with("kind", 1u8)
                .with(
                    "body",
                    serialize(&header_layout(), &header_value(2, 42)).unwrap(),
                )
                .into(),
        )
        .unwrap();

        let generic = deserialize(&envelope, &raw).unwrap();
        let body = generic.as_record().unwrap().bytes("body").unwrap().clone();

        let typed_layout = envelope.clone().customize("body", header_layout()).unwrap();
        let typed = deserialize(&typed_layout, &raw).unwrap();
        let typed_body = typed.as_record().unwrap().get("body").unwrap();
        assert_eq!(typed_body, &header_value(2, 42));

        // the raw slot re-decodes to the same structure later
        assert_eq!(deserialize(&header_layout(), &body).unwrap(), header_value(2, 42));
        // and both views re-encode to the original bytes
        assert_eq!(serialize(&envelope, &generic).unwrap(), raw);
        assert_eq!(serialize(&typed_layout, &typed).unwrap(), raw);
    }

    #[test]
    fn test_customized_slot_rejects_trailing_inner_bytes() {
        let layout = Layout::new()
            .prefixed("body", LengthPrefix::U8, None)
            .customize("body", Layout::new().uint("x", 1))
            .unwrap();
        let err = deserialize(&layout, &[2, 7, 7]).unwrap_err();
        assert_eq!(err, LayoutError::TrailingBytes { remaining: 1 });
    }

    #[test]
    fn test_customize_nested_path() {
        let layout = Layout::new()
            .nested("outer", Layout::new().tail("payload", None))
            .customize("outer.payload", Layout::new().uint("x", 2))
            .unwrap();
        let value = deserialize(&layout, &[0x12, 0x34]).unwrap();
        let outer = value.as_record().unwrap().get("outer").unwrap();
        let payload = outer.as_record().unwrap().get("payload").unwrap();
        assert_eq!(payload.as_record().unwrap().uint("x").unwrap(), 0x1234);
    }

    #[test]
    fn test_customize_non_slot_fails() {
        let result = header_layout().customize("version", Layout::new());
        assert!(matches!(result, Err(LayoutError::InvalidLayout(_))));
    }

    #[test]
    fn test_array_of_records() {
        let element = Layout::new().uint("index", 1).bytes("sig", 2);
        let layout = Layout::new().array("items", LengthPrefix::U8, element);
        let value: Value = Record::new()
            .with(
                "items",
                vec![
                    Value::from(Record::new().with("index", 0u8).with("sig", vec![1u8, 1])),
                    Value::from(Record::new().with("index", 3u8).with("sig", vec![2u8, 2])),
                ],
            )
            .into();
        let bytes = serialize(&layout, &value).unwrap();
        assert_eq!(bytes, vec![2, 0, 1, 1, 3, 2, 2]);
        assert_eq!(deserialize(&layout, &bytes).unwrap(), value);
        assert_eq!(layout.fixed_size(), None);
    }

    #[test]
    fn test_array_count_exceeding_buffer() {
        let layout = Layout::new().array("items", LengthPrefix::U8, Layout::new().uint("x", 4));
        assert!(matches!(
            deserialize(&layout, &[200, 0, 0]).unwrap_err(),
            LayoutError::ShortBuffer { .. }
        ));
    }

    #[test]
    fn test_wrong_value_type() {
        let layout = Layout::new().bytes("emitter", 4);
        let err = serialize(&layout, &Record::new().with("emitter", 4u8).into()).unwrap_err();
        assert_eq!(
            err,
            LayoutError::TypeMismatch {
                field: "emitter",
                expected: "bytes"
            }
        );
    }

    #[test]
    fn test_missing_field() {
        let err = serialize(&header_layout(), &Record::new().with("version", 1u8).into()).unwrap_err();
        assert_eq!(err, LayoutError::MissingField("sequence"));
    }

    #[test]
    fn test_invalid_integer_size() {
        let layout = Layout::new().uint("huge", 17);
        assert!(matches!(
            deserialize(&layout, &[0u8; 17]).unwrap_err(),
            LayoutError::InvalidLayout(_)
        ));
    }
}
