//! Protobuf-compatible field encoding.
//!
//! Stored boxes are proto3 messages, so this module implements just enough
//! of the protobuf wire format to read and write them byte-exactly:
//! - Fields are written in ascending field-number order
//! - Empty bytes/string fields and zero integers are omitted
//! - Nested messages are length-delimited and always written
//! - Unknown fields are skipped on read

use bytes::{Buf, BufMut};

use crate::error::{BoxError, Result};

/// Protobuf wire types.
pub(crate) mod wire_type {
    pub const VARINT: u8 = 0;
    pub const FIXED64: u8 = 1;
    pub const LEN: u8 = 2;
    pub const FIXED32: u8 = 5;
}

/// A decoded field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Field<'a> {
    Varint(u64),
    Fixed64(u64),
    Bytes(&'a [u8]),
    Fixed32(u32),
}

impl<'a> Field<'a> {
    /// Interpret as a length-delimited payload.
    pub fn bytes(self, name: &str) -> Result<&'a [u8]> {
        match self {
            Field::Bytes(b) => Ok(b),
            _ => Err(malformed(format!("{name}: expected length-delimited field"))),
        }
    }

    /// Interpret as a UTF-8 string.
    pub fn string(self, name: &str) -> Result<String> {
        let bytes = self.bytes(name)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| malformed(format!("{name}: invalid UTF-8")))
    }

    /// Interpret as a uint32 varint.
    pub fn uint32(self, name: &str) -> Result<u32> {
        match self {
            Field::Varint(v) => {
                u32::try_from(v).map_err(|_| malformed(format!("{name}: value out of range")))
            }
            _ => Err(malformed(format!("{name}: expected varint field"))),
        }
    }
}

pub(crate) fn malformed(msg: impl Into<String>) -> BoxError {
    BoxError::MalformedBox(msg.into())
}

// ─────────────────────────────────────────────────────────────────────────────
// Writing
// ─────────────────────────────────────────────────────────────────────────────

pub(crate) fn put_varint(buf: &mut impl BufMut, mut value: u64) {
    while value >= 0x80 {
        buf.put_u8((value as u8) | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

fn put_key(buf: &mut impl BufMut, field: u32, wire: u8) {
    put_varint(buf, (u64::from(field) << 3) | u64::from(wire));
}

/// Write a `bytes`/`string` field, omitted when empty.
pub(crate) fn put_bytes_field(buf: &mut impl BufMut, field: u32, value: &[u8]) {
    if value.is_empty() {
        return;
    }
    put_len_delimited(buf, field, value);
}

/// Write an embedded message. Repeated entries are written even when empty.
pub(crate) fn put_message_field(buf: &mut impl BufMut, field: u32, message: &[u8]) {
    put_len_delimited(buf, field, message);
}

/// Write a `uint32` field, omitted when zero.
pub(crate) fn put_uint32_field(buf: &mut impl BufMut, field: u32, value: u32) {
    if value == 0 {
        return;
    }
    put_key(buf, field, wire_type::VARINT);
    put_varint(buf, u64::from(value));
}

fn put_len_delimited(buf: &mut impl BufMut, field: u32, value: &[u8]) {
    put_key(buf, field, wire_type::LEN);
    put_varint(buf, value.len() as u64);
    buf.put_slice(value);
}

// ─────────────────────────────────────────────────────────────────────────────
// Reading
// ─────────────────────────────────────────────────────────────────────────────

fn get_varint(buf: &mut &[u8]) -> Result<u64> {
    let mut value: u64 = 0;
    for i in 0..10 {
        if !buf.has_remaining() {
            return Err(malformed("truncated varint"));
        }
        let byte = buf.get_u8();
        // The tenth byte may only carry the top bit of a u64.
        if i == 9 && byte > 0x01 {
            return Err(malformed("varint overflow"));
        }
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte < 0x80 {
            return Ok(value);
        }
    }
    Err(malformed("varint overflow"))
}

/// Iterates over the fields of one message.
pub(crate) struct FieldReader<'a> {
    buf: &'a [u8],
}

impl<'a> FieldReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Read the next `(field number, value)` pair, or `None` at end of input.
    pub fn next_field(&mut self) -> Result<Option<(u32, Field<'a>)>> {
        if !self.buf.has_remaining() {
            return Ok(None);
        }

        let key = get_varint(&mut self.buf)?;
        let field = u32::try_from(key >> 3).map_err(|_| malformed("field number out of range"))?;
        if field == 0 {
            return Err(malformed("field number zero"));
        }

        let value = match (key & 0x07) as u8 {
            wire_type::VARINT => Field::Varint(get_varint(&mut self.buf)?),
            wire_type::FIXED64 => {
                if self.buf.remaining() < 8 {
                    return Err(malformed("truncated fixed64"));
                }
                Field::Fixed64(self.buf.get_u64_le())
            }
            wire_type::LEN => {
                let len = get_varint(&mut self.buf)?;
                let len = usize::try_from(len).map_err(|_| malformed("length out of range"))?;
                if self.buf.remaining() < len {
                    return Err(malformed("truncated length-delimited field"));
                }
                let (value, rest) = self.buf.split_at(len);
                self.buf = rest;
                Field::Bytes(value)
            }
            wire_type::FIXED32 => {
                if self.buf.remaining() < 4 {
                    return Err(malformed("truncated fixed32"));
                }
                Field::Fixed32(self.buf.get_u32_le())
            }
            other => return Err(malformed(format!("unsupported wire type {other}"))),
        };

        Ok(Some((field, value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(bytes: &[u8]) -> Result<Vec<(u32, Field<'_>)>> {
        let mut reader = FieldReader::new(bytes);
        let mut fields = Vec::new();
        while let Some(f) = reader.next_field()? {
            fields.push(f);
        }
        Ok(fields)
    }

    #[test]
    fn test_varint_encoding() {
        let mut buf = Vec::new();
        put_varint(&mut buf, 300);
        assert_eq!(buf, vec![0xac, 0x02]);

        let mut slice = &buf[..];
        assert_eq!(get_varint(&mut slice).unwrap(), 300);
        assert!(slice.is_empty());
    }

    #[test]
    fn test_varint_max() {
        let mut buf = Vec::new();
        put_varint(&mut buf, u64::MAX);
        assert_eq!(buf.len(), 10);

        let mut slice = &buf[..];
        assert_eq!(get_varint(&mut slice).unwrap(), u64::MAX);
    }

    #[test]
    fn test_varint_overflow_rejected() {
        let bytes = [0xffu8; 11];
        let mut slice = &bytes[..];
        assert!(get_varint(&mut slice).is_err());
    }

    #[test]
    fn test_empty_bytes_field_omitted() {
        let mut buf = Vec::new();
        put_bytes_field(&mut buf, 1, &[]);
        put_uint32_field(&mut buf, 2, 0);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_empty_message_field_written() {
        let mut buf = Vec::new();
        put_message_field(&mut buf, 2, &[]);
        assert_eq!(buf, vec![0x12, 0x00]);
    }

    #[test]
    fn test_read_fields() {
        let mut buf = Vec::new();
        put_bytes_field(&mut buf, 1, b"abc");
        put_uint32_field(&mut buf, 2, 7);

        let fields = read_all(&buf).unwrap();
        assert_eq!(fields, vec![(1, Field::Bytes(b"abc")), (2, Field::Varint(7))]);
    }

    #[test]
    fn test_read_fixed_fields() {
        // field 3 fixed64, field 4 fixed32
        let mut buf = vec![0x19];
        buf.extend_from_slice(&1u64.to_le_bytes());
        buf.push(0x25);
        buf.extend_from_slice(&2u32.to_le_bytes());

        let fields = read_all(&buf).unwrap();
        assert_eq!(fields, vec![(3, Field::Fixed64(1)), (4, Field::Fixed32(2))]);
    }

    #[test]
    fn test_truncated_input_rejected() {
        let mut buf = Vec::new();
        put_bytes_field(&mut buf, 1, b"abcdef");
        buf.truncate(buf.len() - 1);

        assert!(matches!(read_all(&buf), Err(BoxError::MalformedBox(_))));
    }

    #[test]
    fn test_unsupported_wire_type_rejected() {
        // field 1, wire type 3 (start group)
        assert!(matches!(read_all(&[0x0b]), Err(BoxError::MalformedBox(_))));
    }

    #[test]
    fn test_field_zero_rejected() {
        assert!(read_all(&[0x02, 0x00]).is_err());
    }

    #[test]
    fn test_field_accessors() {
        assert_eq!(Field::Bytes(b"hi").string("s").unwrap(), "hi");
        assert!(Field::Bytes(&[0xff, 0xfe]).string("s").is_err());
        assert!(Field::Varint(1).bytes("b").is_err());
        assert!(Field::Varint(u64::from(u32::MAX) + 1).uint32("n").is_err());
        assert_eq!(Field::Varint(5).uint32("n").unwrap(), 5);
    }

    proptest::proptest! {
        #[test]
        fn decoding_arbitrary_bytes_never_panics(bytes in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..256)) {
            let _ = read_all(&bytes);
            let _ = crate::model::AccessBox::from_bytes(&bytes);
        }
    }
}
