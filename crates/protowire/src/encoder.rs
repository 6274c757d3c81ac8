//! Append-only writer of wire primitives.

use protowire_buffers::utf16_to_utf8;
use protowire_util::{
    split_decimal_string, split_float32, split_float64, split_int64, split_uint64,
    split_unsigned_decimal_string, split_zigzag64, to_zigzag64, Hash64, SplitValue64,
};

use crate::constants::NEGATIVE_INT32_VARINT_LEN;
use crate::error::EncodeError;

/// Appends wire primitives to a growable byte buffer.
///
/// # Example
///
/// ```
/// use protowire::Encoder;
///
/// let mut encoder = Encoder::new();
/// encoder.write_unsigned_varint32(300);
/// encoder.write_signed_varint32(-1);
/// let bytes = encoder.end();
/// assert_eq!(bytes.len(), 12);
/// assert_eq!(&bytes[..2], &[0xac, 0x02]);
/// assert_eq!(encoder.length(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    buffer: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written since the last [`end`](Self::end).
    pub fn length(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Returns the accumulated bytes and leaves the encoder empty.
    pub fn end(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }

    // ---------------------------------------------------------------- varints

    /// Writes a split pair as a varint, seven bits at a time from the low end.
    pub fn write_split_varint64(&mut self, value: SplitValue64) {
        let SplitValue64 { mut lo, mut hi } = value;
        while hi > 0 || lo > 127 {
            self.buffer.push(((lo & 0x7f) | 0x80) as u8);
            lo = (lo >> 7) | (hi << 25);
            hi >>= 7;
        }
        self.buffer.push(lo as u8);
    }

    /// Writes a split pair as eight little-endian bytes.
    pub fn write_split_fixed64(&mut self, value: SplitValue64) {
        self.write_uint32(value.lo);
        self.write_uint32(value.hi);
    }

    /// Zigzag-encodes a two's-complement pair and writes it as a varint.
    pub fn write_split_zigzag_varint64(&mut self, value: SplitValue64) {
        self.write_split_varint64(to_zigzag64(value));
    }

    pub fn write_unsigned_varint32(&mut self, mut value: u32) {
        while value > 127 {
            self.buffer.push(((value & 0x7f) | 0x80) as u8);
            value >>= 7;
        }
        self.buffer.push(value as u8);
    }

    /// Writes an `int32`. Negative values are sign-extended to 64 bits and
    /// always take ten bytes.
    pub fn write_signed_varint32(&mut self, value: i32) {
        if value >= 0 {
            self.write_unsigned_varint32(value as u32);
        } else {
            self.write_split_varint64(split_int64(value as i64));
        }
    }

    pub fn write_zigzag_varint32(&mut self, value: i32) {
        self.write_unsigned_varint32(((value << 1) ^ (value >> 31)) as u32);
    }

    pub fn write_unsigned_varint64(&mut self, value: u64) {
        self.write_split_varint64(split_uint64(value));
    }

    pub fn write_signed_varint64(&mut self, value: i64) {
        self.write_split_varint64(split_int64(value));
    }

    pub fn write_zigzag_varint64(&mut self, value: i64) {
        self.write_split_varint64(split_zigzag64(value));
    }

    /// Writes unsigned decimal text as a 64-bit varint.
    pub fn write_unsigned_varint64_string(&mut self, value: &str) -> Result<(), EncodeError> {
        self.write_split_varint64(split_unsigned_decimal_string(value)?);
        Ok(())
    }

    /// Writes decimal text (optionally `-`-prefixed) as a 64-bit varint.
    pub fn write_signed_varint64_string(&mut self, value: &str) -> Result<(), EncodeError> {
        self.write_split_varint64(split_decimal_string(value)?);
        Ok(())
    }

    pub fn write_zigzag_varint64_string(&mut self, value: &str) -> Result<(), EncodeError> {
        self.write_split_zigzag_varint64(split_decimal_string(value)?);
        Ok(())
    }

    pub fn write_varint_hash64(&mut self, hash: Hash64) {
        self.write_split_varint64(hash.split());
    }

    /// Treats the hash as a signed value and writes it zigzag-encoded.
    pub fn write_zigzag_varint_hash64(&mut self, hash: Hash64) {
        self.write_split_zigzag_varint64(hash.split());
    }

    // ---------------------------------------------------------------- fixed width

    pub fn write_uint8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    pub fn write_uint16(&mut self, value: u16) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_uint32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_uint64(&mut self, value: u64) {
        self.write_split_fixed64(split_uint64(value));
    }

    pub fn write_uint64_string(&mut self, value: &str) -> Result<(), EncodeError> {
        self.write_split_fixed64(split_unsigned_decimal_string(value)?);
        Ok(())
    }

    pub fn write_int8(&mut self, value: i8) {
        self.buffer.push(value as u8);
    }

    pub fn write_int16(&mut self, value: i16) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_int32(&mut self, value: i32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_int64(&mut self, value: i64) {
        self.write_split_fixed64(split_int64(value));
    }

    pub fn write_int64_string(&mut self, value: &str) -> Result<(), EncodeError> {
        self.write_split_fixed64(split_decimal_string(value)?);
        Ok(())
    }

    pub fn write_fixed_hash64(&mut self, hash: Hash64) {
        self.buffer.extend_from_slice(hash.as_bytes());
    }

    /// Writes the IEEE-754 single-precision bits of `value`.
    pub fn write_float(&mut self, value: f32) {
        self.write_uint32(split_float32(value as f64));
    }

    /// Writes the IEEE-754 double-precision bits of `value`.
    pub fn write_double(&mut self, value: f64) {
        self.write_split_fixed64(split_float64(value));
    }

    // ---------------------------------------------------------------- misc scalars

    pub fn write_bool(&mut self, value: bool) {
        self.buffer.push(value as u8);
    }

    pub fn write_enum(&mut self, value: i32) {
        self.write_signed_varint32(value);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Appends the UTF-8 bytes of `value` and returns how many were written.
    pub fn write_string(&mut self, value: &str) -> usize {
        self.buffer.extend_from_slice(value.as_bytes());
        value.len()
    }

    /// Transcodes UTF-16 code units to UTF-8 and returns the byte count.
    /// Unpaired surrogates become U+FFFD.
    pub fn write_utf16(&mut self, units: &[u16]) -> usize {
        utf16_to_utf8(units, &mut self.buffer)
    }
}

/// Number of bytes `value` takes as a varint.
pub fn varint_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

/// Number of bytes an `int32` takes as a varint.
pub fn signed_varint32_len(value: i32) -> usize {
    if value < 0 {
        NEGATIVE_INT32_VARINT_LEN
    } else {
        varint_len(value as u64)
    }
}
