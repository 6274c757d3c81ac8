//! Field-level writer with deferred submessage lengths.

use protowire_buffers::{concat_blocks, utf8_len_of_utf16};
use protowire_util::{
    split_decimal_string, split_unsigned_decimal_string, DecimalError, Hash64, SplitValue64,
};

use crate::constants::{FieldType, WireType, MAX_FIELD_NUMBER};
use crate::encoder::Encoder;
use crate::error::EncodeError;
use crate::value::ScalarValue;

/// Handle to an open delimited region, returned by
/// [`Writer::begin_delimited`] and consumed by [`Writer::end_delimited`].
///
/// Holds the index of the block that ends with the region's tag, and the
/// writer's total length at the moment the region opened.
#[derive(Debug)]
#[must_use = "an open delimited region must be closed with end_delimited"]
pub struct Bookmark {
    block: usize,
    start: usize,
}

/// Serializes fields into a list of byte blocks plus a live encoder.
///
/// Submessage lengths are not known until the body is written, so
/// [`begin_delimited`](Self::begin_delimited) closes the current block right
/// after the field tag and hands back a [`Bookmark`]. When the body is done,
/// [`end_delimited`](Self::end_delimited) appends the length varint to that
/// block. [`result_buffer`](Self::result_buffer) collapses everything into
/// one contiguous buffer.
///
/// # Example
///
/// ```
/// use protowire::Writer;
///
/// let mut writer = Writer::new();
/// writer.write_int32(1, 150);
/// let bookmark = writer.begin_delimited(3);
/// writer.write_string(2, "hi");
/// writer.end_delimited(bookmark);
/// assert_eq!(
///     writer.result_buffer(),
///     [0x08, 0x96, 0x01, 0x1a, 0x04, 0x12, 0x02, b'h', b'i']
/// );
/// ```
#[derive(Debug, Default)]
pub struct Writer {
    blocks: Vec<Vec<u8>>,
    total_length: usize,
    encoder: Encoder,
}

macro_rules! repeated_writers {
    ($($name:ident => $single:ident($ty:ty);)*) => {
        $(
            pub fn $name(&mut self, field: u32, values: &[$ty]) {
                for value in values {
                    self.$single(field, *value);
                }
            }
        )*
    };
}

macro_rules! packed_varint_writers {
    ($($name:ident => $encode:ident($ty:ty);)*) => {
        $(
            pub fn $name(&mut self, field: u32, values: &[$ty]) {
                if values.is_empty() {
                    return;
                }
                let bookmark = self.begin_delimited(field);
                for value in values {
                    self.encoder.$encode(*value);
                }
                self.end_delimited(bookmark);
            }
        )*
    };
}

macro_rules! packed_fixed_writers {
    ($($name:ident => $encode:ident($ty:ty, $width:expr);)*) => {
        $(
            pub fn $name(&mut self, field: u32, values: &[$ty]) {
                if values.is_empty() {
                    return;
                }
                self.write_field_header(field, WireType::Delimited);
                self.encoder.write_unsigned_varint32((values.len() * $width) as u32);
                for value in values {
                    self.encoder.$encode(*value);
                }
            }
        )*
    };
}

impl Writer {
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            total_length: 0,
            encoder: Encoder::new(),
        }
    }

    /// Total bytes written so far, including the live encoder.
    pub fn length(&self) -> usize {
        self.total_length + self.encoder.length()
    }

    /// Discards everything written.
    pub fn reset(&mut self) {
        self.blocks.clear();
        self.total_length = 0;
        self.encoder.end();
    }

    /// Flattens all blocks and the live encoder into a single buffer and
    /// leaves the writer empty.
    pub fn result_buffer(&mut self) -> Vec<u8> {
        let tail = self.encoder.end();
        let total = self.total_length + tail.len();
        let out = concat_blocks(&self.blocks, &tail, total);
        self.blocks.clear();
        self.total_length = 0;
        out
    }

    fn flush_encoder(&mut self) {
        let block = self.encoder.end();
        self.total_length += block.len();
        self.blocks.push(block);
    }

    // ---------------------------------------------------------------- framing

    pub fn write_field_header(&mut self, field: u32, wire_type: WireType) {
        debug_assert!(
            (1..=MAX_FIELD_NUMBER).contains(&field),
            "invalid field number {field}"
        );
        self.encoder
            .write_unsigned_varint32((field << 3) | wire_type as u32);
    }

    /// Writes a delimited tag for `field` and opens a region whose length is
    /// patched in by [`end_delimited`](Self::end_delimited).
    pub fn begin_delimited(&mut self, field: u32) -> Bookmark {
        self.write_field_header(field, WireType::Delimited);
        self.flush_encoder();
        Bookmark {
            block: self.blocks.len() - 1,
            start: self.total_length,
        }
    }

    /// Closes a region opened by [`begin_delimited`](Self::begin_delimited).
    pub fn end_delimited(&mut self, bookmark: Bookmark) {
        let length = self.total_length + self.encoder.length() - bookmark.start;
        let block = &mut self.blocks[bookmark.block];
        let before = block.len();
        push_varint(block, length as u64);
        self.total_length += block.len() - before;
        tracing::trace!(block = bookmark.block, length, "patched delimited length");
    }

    /// Appends bytes that are already a serialized sequence of fields.
    pub fn write_serialized_message(&mut self, bytes: &[u8]) {
        self.encoder.write_bytes(bytes);
    }

    pub fn maybe_write_serialized_message(&mut self, bytes: Option<&[u8]>) {
        if let Some(bytes) = bytes {
            self.write_serialized_message(bytes);
        }
    }

    // ---------------------------------------------------------------- varint scalars

    /// Writes an `int32` field. Negative values are sign-extended and always
    /// take ten bytes.
    pub fn write_int32(&mut self, field: u32, value: i32) {
        self.write_field_header(field, WireType::Varint);
        self.encoder.write_signed_varint32(value);
    }

    pub fn write_int64(&mut self, field: u32, value: i64) {
        self.write_field_header(field, WireType::Varint);
        self.encoder.write_signed_varint64(value);
    }

    /// Writes an `int64` field from decimal text, without going through a
    /// native integer. Nothing is written when the text does not parse.
    pub fn write_int64_string(&mut self, field: u32, value: &str) -> Result<(), EncodeError> {
        let split = split_decimal_string(value)?;
        self.write_split_varint64(field, split);
        Ok(())
    }

    pub fn write_uint32(&mut self, field: u32, value: u32) {
        self.write_field_header(field, WireType::Varint);
        self.encoder.write_unsigned_varint32(value);
    }

    pub fn write_uint64(&mut self, field: u32, value: u64) {
        self.write_field_header(field, WireType::Varint);
        self.encoder.write_unsigned_varint64(value);
    }

    /// Like [`write_int64_string`](Self::write_int64_string), but a leading
    /// `-` is rejected with [`DecimalError::Negative`].
    pub fn write_uint64_string(&mut self, field: u32, value: &str) -> Result<(), EncodeError> {
        let split = split_unsigned_decimal_string(value)?;
        self.write_split_varint64(field, split);
        Ok(())
    }

    /// Zigzag-encoded, so small negative numbers stay short.
    pub fn write_sint32(&mut self, field: u32, value: i32) {
        self.write_field_header(field, WireType::Varint);
        self.encoder.write_zigzag_varint32(value);
    }

    pub fn write_sint64(&mut self, field: u32, value: i64) {
        self.write_field_header(field, WireType::Varint);
        self.encoder.write_zigzag_varint64(value);
    }

    pub fn write_sint64_string(&mut self, field: u32, value: &str) -> Result<(), EncodeError> {
        let split = split_decimal_string(value)?;
        self.write_split_zigzag_varint64(field, split);
        Ok(())
    }

    pub fn write_bool(&mut self, field: u32, value: bool) {
        self.write_field_header(field, WireType::Varint);
        self.encoder.write_bool(value);
    }

    /// Writes an enum by number; values without a known name pass through.
    pub fn write_enum(&mut self, field: u32, value: i32) {
        self.write_field_header(field, WireType::Varint);
        self.encoder.write_enum(value);
    }

    /// Writes a 64-bit varint from its two 32-bit halves.
    pub fn write_split_varint64(&mut self, field: u32, value: SplitValue64) {
        self.write_field_header(field, WireType::Varint);
        self.encoder.write_split_varint64(value);
    }

    pub fn write_split_zigzag_varint64(&mut self, field: u32, value: SplitValue64) {
        self.write_field_header(field, WireType::Varint);
        self.encoder.write_split_zigzag_varint64(value);
    }

    pub fn write_varint_hash64(&mut self, field: u32, hash: Hash64) {
        self.write_field_header(field, WireType::Varint);
        self.encoder.write_varint_hash64(hash);
    }

    /// Writes the hash's bit pattern as a zigzag varint.
    pub fn write_sint_hash64(&mut self, field: u32, hash: Hash64) {
        self.write_field_header(field, WireType::Varint);
        self.encoder.write_zigzag_varint_hash64(hash);
    }

    // ---------------------------------------------------------------- fixed scalars

    /// Four little-endian bytes after the tag.
    pub fn write_fixed32(&mut self, field: u32, value: u32) {
        self.write_field_header(field, WireType::Fixed32);
        self.encoder.write_uint32(value);
    }

    pub fn write_sfixed32(&mut self, field: u32, value: i32) {
        self.write_field_header(field, WireType::Fixed32);
        self.encoder.write_int32(value);
    }

    /// Writes the IEEE-754 single-precision bits of `value`; NaN payloads are
    /// canonicalized.
    pub fn write_float(&mut self, field: u32, value: f32) {
        self.write_field_header(field, WireType::Fixed32);
        self.encoder.write_float(value);
    }

    pub fn write_fixed64(&mut self, field: u32, value: u64) {
        self.write_field_header(field, WireType::Fixed64);
        self.encoder.write_uint64(value);
    }

    /// Unsigned decimal text as eight little-endian bytes.
    pub fn write_fixed64_string(&mut self, field: u32, value: &str) -> Result<(), EncodeError> {
        let split = split_unsigned_decimal_string(value)?;
        self.write_split_fixed64(field, split);
        Ok(())
    }

    pub fn write_sfixed64(&mut self, field: u32, value: i64) {
        self.write_field_header(field, WireType::Fixed64);
        self.encoder.write_int64(value);
    }

    pub fn write_sfixed64_string(&mut self, field: u32, value: &str) -> Result<(), EncodeError> {
        let split = split_decimal_string(value)?;
        self.write_split_fixed64(field, split);
        Ok(())
    }

    /// Writes the IEEE-754 double-precision bits of `value`.
    pub fn write_double(&mut self, field: u32, value: f64) {
        self.write_field_header(field, WireType::Fixed64);
        self.encoder.write_double(value);
    }

    pub fn write_split_fixed64(&mut self, field: u32, value: SplitValue64) {
        self.write_field_header(field, WireType::Fixed64);
        self.encoder.write_split_fixed64(value);
    }

    pub fn write_fixed_hash64(&mut self, field: u32, hash: Hash64) {
        self.write_field_header(field, WireType::Fixed64);
        self.encoder.write_fixed_hash64(hash);
    }

    // ---------------------------------------------------------------- delimited

    pub fn write_string(&mut self, field: u32, value: &str) {
        self.write_field_header(field, WireType::Delimited);
        self.encoder.write_unsigned_varint32(value.len() as u32);
        self.encoder.write_string(value);
    }

    /// Writes UTF-16 text as a UTF-8 string field. Unpaired surrogates are
    /// replaced with U+FFFD.
    pub fn write_utf16_string(&mut self, field: u32, units: &[u16]) {
        self.write_field_header(field, WireType::Delimited);
        self.encoder
            .write_unsigned_varint32(utf8_len_of_utf16(units) as u32);
        self.encoder.write_utf16(units);
    }

    /// Writes a bytes field. An empty slice still produces a tag and a zero
    /// length.
    pub fn write_bytes(&mut self, field: u32, value: &[u8]) {
        self.write_field_header(field, WireType::Delimited);
        self.encoder.write_unsigned_varint32(value.len() as u32);
        self.encoder.write_bytes(value);
    }

    /// Writes `value` as a length-delimited submessage; `write` emits its
    /// fields.
    pub fn write_message<M: ?Sized>(
        &mut self,
        field: u32,
        value: &M,
        write: impl FnOnce(&M, &mut Writer),
    ) {
        let bookmark = self.begin_delimited(field);
        write(value, self);
        self.end_delimited(bookmark);
    }

    /// Writes `value` between START_GROUP and END_GROUP tags.
    pub fn write_group<M: ?Sized>(
        &mut self,
        field: u32,
        value: &M,
        write: impl FnOnce(&M, &mut Writer),
    ) {
        self.write_field_header(field, WireType::StartGroup);
        write(value, self);
        self.write_field_header(field, WireType::EndGroup);
    }

    /// Writes one synthetic map entry message with the key as field 1 and the
    /// value as field 2.
    pub fn write_map_entry<K, V>(
        &mut self,
        field: u32,
        key: K,
        value: V,
        write_key: impl FnOnce(&mut Writer, u32, K),
        write_value: impl FnOnce(&mut Writer, u32, V),
    ) {
        let bookmark = self.begin_delimited(field);
        write_key(self, 1, key);
        write_value(self, 2, value);
        self.end_delimited(bookmark);
    }

    /// Writes a dynamically typed scalar.
    pub fn write_any(
        &mut self,
        field_type: FieldType,
        field: u32,
        value: &ScalarValue,
    ) -> Result<(), EncodeError> {
        use ScalarValue as V;
        match (field_type, value) {
            (FieldType::Double, V::Double(v)) => self.write_double(field, *v),
            (FieldType::Float, V::Float(v)) => self.write_float(field, *v),
            (FieldType::Int32, V::Int32(v)) => self.write_int32(field, *v),
            (FieldType::Sint32, V::Int32(v)) => self.write_sint32(field, *v),
            (FieldType::Sfixed32, V::Int32(v)) => self.write_sfixed32(field, *v),
            (FieldType::Int64, V::Int64(v)) => self.write_int64(field, *v),
            (FieldType::Sint64, V::Int64(v)) => self.write_sint64(field, *v),
            (FieldType::Sfixed64, V::Int64(v)) => self.write_sfixed64(field, *v),
            (FieldType::Uint32, V::Uint32(v)) => self.write_uint32(field, *v),
            (FieldType::Fixed32, V::Uint32(v)) => self.write_fixed32(field, *v),
            (FieldType::Uint64, V::Uint64(v)) => self.write_uint64(field, *v),
            (FieldType::Fixed64, V::Uint64(v)) => self.write_fixed64(field, *v),
            (FieldType::Bool, V::Bool(v)) => self.write_bool(field, *v),
            (FieldType::Enum, V::Enum(v) | V::Int32(v)) => self.write_enum(field, *v),
            (FieldType::String, V::String(v)) => self.write_string(field, v),
            (FieldType::Bytes, V::Bytes(v)) => self.write_bytes(field, v),
            (FieldType::FixedHash64, V::Hash(v)) => self.write_fixed_hash64(field, *v),
            (FieldType::VarintHash64, V::Hash(v)) => self.write_varint_hash64(field, *v),
            (FieldType::Group | FieldType::Message, _) => {
                return Err(EncodeError::UnsupportedFieldType(field_type))
            }
            _ => return Err(EncodeError::ValueMismatch(field_type)),
        }
        Ok(())
    }

    // ---------------------------------------------------------------- repeated

    repeated_writers! {
        write_repeated_int32 => write_int32(i32);
        write_repeated_int64 => write_int64(i64);
        write_repeated_uint32 => write_uint32(u32);
        write_repeated_uint64 => write_uint64(u64);
        write_repeated_sint32 => write_sint32(i32);
        write_repeated_sint64 => write_sint64(i64);
        write_repeated_fixed32 => write_fixed32(u32);
        write_repeated_fixed64 => write_fixed64(u64);
        write_repeated_sfixed32 => write_sfixed32(i32);
        write_repeated_sfixed64 => write_sfixed64(i64);
        write_repeated_float => write_float(f32);
        write_repeated_double => write_double(f64);
        write_repeated_bool => write_bool(bool);
        write_repeated_enum => write_enum(i32);
        write_repeated_fixed_hash64 => write_fixed_hash64(Hash64);
        write_repeated_varint_hash64 => write_varint_hash64(Hash64);
    }

    pub fn write_repeated_string<S: AsRef<str>>(&mut self, field: u32, values: &[S]) {
        for value in values {
            self.write_string(field, value.as_ref());
        }
    }

    pub fn write_repeated_bytes<B: AsRef<[u8]>>(&mut self, field: u32, values: &[B]) {
        for value in values {
            self.write_bytes(field, value.as_ref());
        }
    }

    pub fn write_repeated_message<M>(
        &mut self,
        field: u32,
        values: &[M],
        write: impl Fn(&M, &mut Writer),
    ) {
        for value in values {
            self.write_message(field, value, &write);
        }
    }

    pub fn write_repeated_group<M>(
        &mut self,
        field: u32,
        values: &[M],
        write: impl Fn(&M, &mut Writer),
    ) {
        for value in values {
            self.write_group(field, value, &write);
        }
    }

    /// Repeated `int64` from decimal text. Nothing is written if any element
    /// fails to parse.
    pub fn write_repeated_int64_string<S: AsRef<str>>(
        &mut self,
        field: u32,
        values: &[S],
    ) -> Result<(), EncodeError> {
        for split in parse_all(values, split_decimal_string)? {
            self.write_split_varint64(field, split);
        }
        Ok(())
    }

    pub fn write_repeated_uint64_string<S: AsRef<str>>(
        &mut self,
        field: u32,
        values: &[S],
    ) -> Result<(), EncodeError> {
        for split in parse_all(values, split_unsigned_decimal_string)? {
            self.write_split_varint64(field, split);
        }
        Ok(())
    }

    pub fn write_repeated_sint64_string<S: AsRef<str>>(
        &mut self,
        field: u32,
        values: &[S],
    ) -> Result<(), EncodeError> {
        for split in parse_all(values, split_decimal_string)? {
            self.write_split_zigzag_varint64(field, split);
        }
        Ok(())
    }

    pub fn write_repeated_fixed64_string<S: AsRef<str>>(
        &mut self,
        field: u32,
        values: &[S],
    ) -> Result<(), EncodeError> {
        for split in parse_all(values, split_unsigned_decimal_string)? {
            self.write_split_fixed64(field, split);
        }
        Ok(())
    }

    pub fn write_repeated_sfixed64_string<S: AsRef<str>>(
        &mut self,
        field: u32,
        values: &[S],
    ) -> Result<(), EncodeError> {
        for split in parse_all(values, split_decimal_string)? {
            self.write_split_fixed64(field, split);
        }
        Ok(())
    }

    // ---------------------------------------------------------------- packed

    packed_varint_writers! {
        write_packed_int32 => write_signed_varint32(i32);
        write_packed_int64 => write_signed_varint64(i64);
        write_packed_uint32 => write_unsigned_varint32(u32);
        write_packed_uint64 => write_unsigned_varint64(u64);
        write_packed_sint32 => write_zigzag_varint32(i32);
        write_packed_sint64 => write_zigzag_varint64(i64);
        write_packed_enum => write_enum(i32);
        write_packed_varint_hash64 => write_varint_hash64(Hash64);
    }

    packed_fixed_writers! {
        write_packed_fixed32 => write_uint32(u32, 4);
        write_packed_sfixed32 => write_int32(i32, 4);
        write_packed_float => write_float(f32, 4);
        write_packed_fixed64 => write_uint64(u64, 8);
        write_packed_sfixed64 => write_int64(i64, 8);
        write_packed_double => write_double(f64, 8);
        write_packed_fixed_hash64 => write_fixed_hash64(Hash64, 8);
        write_packed_bool => write_bool(bool, 1);
    }

    pub fn write_packed_int64_string<S: AsRef<str>>(
        &mut self,
        field: u32,
        values: &[S],
    ) -> Result<(), EncodeError> {
        let splits = parse_all(values, split_decimal_string)?;
        self.write_packed_split_varint64(field, splits);
        Ok(())
    }

    pub fn write_packed_uint64_string<S: AsRef<str>>(
        &mut self,
        field: u32,
        values: &[S],
    ) -> Result<(), EncodeError> {
        let splits = parse_all(values, split_unsigned_decimal_string)?;
        self.write_packed_split_varint64(field, splits);
        Ok(())
    }

    fn write_packed_split_varint64(&mut self, field: u32, splits: Vec<SplitValue64>) {
        if splits.is_empty() {
            return;
        }
        let bookmark = self.begin_delimited(field);
        for split in splits {
            self.encoder.write_split_varint64(split);
        }
        self.end_delimited(bookmark);
    }

    pub fn write_packed_sint64_string<S: AsRef<str>>(
        &mut self,
        field: u32,
        values: &[S],
    ) -> Result<(), EncodeError> {
        let splits = parse_all(values, split_decimal_string)?;
        if splits.is_empty() {
            return Ok(());
        }
        let bookmark = self.begin_delimited(field);
        for split in splits {
            self.encoder.write_split_zigzag_varint64(split);
        }
        self.end_delimited(bookmark);
        Ok(())
    }

    pub fn write_packed_fixed64_string<S: AsRef<str>>(
        &mut self,
        field: u32,
        values: &[S],
    ) -> Result<(), EncodeError> {
        let splits = parse_all(values, split_unsigned_decimal_string)?;
        self.write_packed_split_fixed64(field, splits);
        Ok(())
    }

    pub fn write_packed_sfixed64_string<S: AsRef<str>>(
        &mut self,
        field: u32,
        values: &[S],
    ) -> Result<(), EncodeError> {
        let splits = parse_all(values, split_decimal_string)?;
        self.write_packed_split_fixed64(field, splits);
        Ok(())
    }

    fn write_packed_split_fixed64(&mut self, field: u32, splits: Vec<SplitValue64>) {
        if splits.is_empty() {
            return;
        }
        self.write_field_header(field, WireType::Delimited);
        self.encoder
            .write_unsigned_varint32((splits.len() * 8) as u32);
        for split in splits {
            self.encoder.write_split_fixed64(split);
        }
    }
}

fn parse_all<S: AsRef<str>>(
    values: &[S],
    parse: fn(&str) -> Result<SplitValue64, DecimalError>,
) -> Result<Vec<SplitValue64>, EncodeError> {
    values
        .iter()
        .map(|value| parse(value.as_ref()).map_err(EncodeError::from))
        .collect()
}

fn push_varint(out: &mut Vec<u8>, mut value: u64) {
    while value > 127 {
        out.push(((value & 0x7f) | 0x80) as u8);
        value >>= 7;
    }
    out.push(value as u8);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_fields() {
        let mut writer = Writer::new();
        writer.write_int32(1, 3);
        assert_eq!(writer.result_buffer(), [8, 3]);
        writer.write_bytes(9, &[]);
        assert_eq!(writer.result_buffer(), [74, 0]);
        writer.write_sint32(2, -1);
        writer.write_fixed32(3, 1);
        assert_eq!(writer.result_buffer(), [0x10, 0x01, 0x1d, 1, 0, 0, 0]);
    }

    #[test]
    fn test_nested_delimited() {
        let mut writer = Writer::new();
        let outer = writer.begin_delimited(1);
        let inner = writer.begin_delimited(2);
        writer.write_int32(3, 1);
        writer.end_delimited(inner);
        writer.write_bool(4, true);
        writer.end_delimited(outer);
        writer.write_int32(5, 7);
        assert_eq!(writer.length(), 10);
        assert_eq!(
            writer.result_buffer(),
            [0x0a, 0x06, 0x12, 0x02, 0x18, 0x01, 0x20, 0x01, 0x28, 0x07]
        );
        assert_eq!(writer.length(), 0);
    }

    #[test]
    fn test_long_submessage_length() {
        let body = "x".repeat(200);
        let mut writer = Writer::new();
        writer.write_message(1, body.as_str(), |s, w| w.write_string(2, s));
        let out = writer.result_buffer();
        // tag, two length bytes (203), tag, two length bytes (200), body
        assert_eq!(&out[..6], &[0x0a, 0xcb, 0x01, 0x12, 0xc8, 0x01]);
        assert_eq!(out.len(), 206);
    }

    #[test]
    fn test_empty_message_still_written() {
        let mut writer = Writer::new();
        writer.write_message(1, &(), |_, _| {});
        assert_eq!(writer.result_buffer(), [0x0a, 0x00]);
    }

    #[test]
    fn test_group() {
        let mut writer = Writer::new();
        writer.write_group(2, &5, |v, w| w.write_int32(1, *v));
        assert_eq!(writer.result_buffer(), [0x13, 0x08, 0x05, 0x14]);
    }

    #[test]
    fn test_packed() {
        let mut writer = Writer::new();
        writer.write_packed_int32(4, &[1, 2, 3]);
        assert_eq!(writer.result_buffer(), [0x22, 0x03, 1, 2, 3]);
        writer.write_packed_fixed32(4, &[1, 2]);
        assert_eq!(writer.result_buffer(), [0x22, 0x08, 1, 0, 0, 0, 2, 0, 0, 0]);
        writer.write_packed_int32(4, &[]);
        writer.write_packed_double(5, &[]);
        assert!(writer.result_buffer().is_empty());
        writer.write_packed_int32(1, &[-1]);
        assert_eq!(writer.result_buffer().len(), 12);
    }

    #[test]
    fn test_repeated() {
        let mut writer = Writer::new();
        writer.write_repeated_int32(1, &[1, 2]);
        writer.write_repeated_string(2, &["a"]);
        assert_eq!(writer.result_buffer(), [0x08, 1, 0x08, 2, 0x12, 1, b'a']);
    }

    #[test]
    fn test_string_variants() {
        let mut writer = Writer::new();
        writer.write_int64_string(1, "-1").unwrap();
        let mut expected = Writer::new();
        expected.write_int64(1, -1);
        assert_eq!(writer.result_buffer(), expected.result_buffer());

        assert!(writer.write_packed_sint64_string(1, &["1", "oops"]).is_err());
        assert_eq!(writer.length(), 0);
        writer.write_packed_sint64_string(1, &["-1", "1"]).unwrap();
        assert_eq!(writer.result_buffer(), [0x0a, 0x02, 0x01, 0x02]);
    }

    #[test]
    fn test_unsigned_strings_do_not_wrap() {
        let mut writer = Writer::new();
        assert_eq!(
            writer.write_uint64_string(1, "-1"),
            Err(EncodeError::Decimal(DecimalError::Negative))
        );
        assert_eq!(
            writer.write_fixed64_string(1, "-1"),
            Err(EncodeError::Decimal(DecimalError::Negative))
        );
        assert!(writer.write_packed_uint64_string(1, &["1", "-1"]).is_err());
        assert!(writer.write_repeated_fixed64_string(1, &["-2"]).is_err());
        assert_eq!(
            writer.write_int64_string(1, "-18446744073709551615"),
            Err(EncodeError::Decimal(DecimalError::Overflow))
        );
        assert_eq!(writer.length(), 0);

        writer.write_sfixed64_string(1, "-9223372036854775808").unwrap();
        writer.write_packed_uint64_string(2, &["18446744073709551615"]).unwrap();
        let mut expected = Writer::new();
        expected.write_sfixed64(1, i64::MIN);
        expected.write_packed_uint64(2, &[u64::MAX]);
        assert_eq!(writer.result_buffer(), expected.result_buffer());
    }

    #[test]
    fn test_utf16_string() {
        let mut writer = Writer::new();
        writer.write_utf16_string(1, &[0x68, 0xd83d, 0xde00]);
        assert_eq!(writer.result_buffer(), [0x0a, 0x05, b'h', 0xf0, 0x9f, 0x98, 0x80]);
    }

    #[test]
    fn test_map_entry() {
        let mut writer = Writer::new();
        writer.write_map_entry(
            7,
            "k",
            10,
            |w, f, k| w.write_string(f, k),
            |w, f, v| w.write_int32(f, v),
        );
        assert_eq!(writer.result_buffer(), [0x3a, 0x05, 0x0a, 0x01, b'k', 0x10, 0x0a]);
    }

    #[test]
    fn test_write_any() {
        let mut writer = Writer::new();
        writer
            .write_any(FieldType::Sint32, 1, &ScalarValue::Int32(-1))
            .unwrap();
        assert_eq!(writer.result_buffer(), [0x08, 0x01]);
        assert_eq!(
            writer.write_any(FieldType::Message, 1, &ScalarValue::Bool(true)),
            Err(EncodeError::UnsupportedFieldType(FieldType::Message))
        );
        assert_eq!(
            writer.write_any(FieldType::Double, 1, &ScalarValue::Bool(true)),
            Err(EncodeError::ValueMismatch(FieldType::Double))
        );
    }

    #[test]
    fn test_serialized_message() {
        let mut writer = Writer::new();
        writer.maybe_write_serialized_message(None);
        writer.maybe_write_serialized_message(Some(&[8, 3]));
        assert_eq!(writer.result_buffer(), [8, 3]);
    }
}
