//! Cursor-based reader of wire primitives over a byte window.

use protowire_buffers::bytes_to_string;
use protowire_util::{
    from_zigzag64, join_float32, join_float64, join_int64, join_signed_decimal_string,
    join_uint64, join_unsigned_decimal_string, join_zigzag64, Hash64, SplitValue64,
};

use crate::constants::MAX_VARINT_LEN;
use crate::error::DecodeError;

/// Sequential, bounds-checked extraction of wire primitives from the window
/// `[start, end)` of a borrowed buffer.
///
/// The decoder knows nothing about tags or wire types; matching those is the
/// [`Reader`](crate::Reader)'s job. Any framing failure sets a sticky error
/// flag, after which every read returns [`DecodeError::Poisoned`].
///
/// # Example
///
/// ```
/// use protowire::Decoder;
///
/// let data = [0xac, 0x02, 0x01];
/// let mut decoder = Decoder::new(&data);
/// assert_eq!(decoder.read_unsigned_varint32().unwrap(), 300);
/// assert_eq!(decoder.cursor(), 2);
/// assert!(decoder.read_bool().unwrap());
/// assert!(decoder.at_end());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Decoder<'a> {
    bytes: &'a [u8],
    start: usize,
    end: usize,
    cursor: usize,
    error: bool,
}

impl<'a> Decoder<'a> {
    /// Creates a decoder over the whole of `bytes`.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            start: 0,
            end: bytes.len(),
            cursor: 0,
            error: false,
        }
    }

    /// Creates a decoder over `bytes[start..start + length]`, clamped to the
    /// buffer.
    pub fn with_window(bytes: &'a [u8], start: usize, length: usize) -> Self {
        let mut decoder = Self::default();
        decoder.set_block(bytes, start, length);
        decoder
    }

    /// Rebinds the decoder to a new window and clears all state.
    pub fn set_block(&mut self, bytes: &'a [u8], start: usize, length: usize) {
        let start = start.min(bytes.len());
        self.bytes = bytes;
        self.start = start;
        self.end = start.saturating_add(length).min(bytes.len());
        self.cursor = start;
        self.error = false;
    }

    /// Drops the buffer and clears all state.
    pub fn clear(&mut self) {
        self.bytes = &[];
        self.start = 0;
        self.end = 0;
        self.cursor = 0;
        self.error = false;
    }

    /// Moves the cursor back to the start of the window.
    pub fn reset(&mut self) {
        self.cursor = self.start;
    }

    /// The whole underlying buffer, not just the window.
    pub fn buffer(&self) -> &'a [u8] {
        self.bytes
    }

    /// Absolute offset where the window begins.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Absolute offset one past the last readable byte.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Narrows or restores the end of the window. Clamped to the buffer.
    pub fn set_end(&mut self, end: usize) {
        self.end = end.min(self.bytes.len());
    }

    /// Absolute offset of the next byte to read.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Moves the cursor to an absolute offset. No bounds check happens until
    /// the next read.
    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor;
    }

    /// Moves the cursor forward by `count` bytes without bounds checks;
    /// [`past_end`](Self::past_end) reports overshoot.
    pub fn advance(&mut self, count: usize) {
        self.cursor += count;
    }

    pub fn at_end(&self) -> bool {
        self.cursor == self.end
    }

    /// Whether [`advance`](Self::advance) or
    /// [`set_cursor`](Self::set_cursor) moved the cursor beyond the window.
    pub fn past_end(&self) -> bool {
        self.cursor > self.end
    }

    /// Bytes left before the end of the window; zero once past it.
    pub fn remaining(&self) -> usize {
        self.end.saturating_sub(self.cursor)
    }

    /// Whether a fatal error has been recorded.
    pub fn has_error(&self) -> bool {
        self.error
    }

    /// Records a fatal error. Every later read fails with `Poisoned`.
    pub(crate) fn fail(&mut self, err: DecodeError) -> DecodeError {
        self.error = true;
        tracing::debug!(error = %err, cursor = self.cursor, end = self.end, "protobuf decode failed");
        err
    }

    #[inline]
    fn next_byte(&mut self) -> Result<u8, DecodeError> {
        if self.error {
            return Err(DecodeError::Poisoned);
        }
        if self.cursor >= self.end {
            let err = DecodeError::Truncated {
                offset: self.cursor,
                needed: 1,
                end: self.end,
            };
            return Err(self.fail(err));
        }
        let byte = self.bytes[self.cursor];
        self.cursor += 1;
        Ok(byte)
    }

    #[inline]
    fn take(&mut self, count: usize) -> Result<&'a [u8], DecodeError> {
        if self.error {
            return Err(DecodeError::Poisoned);
        }
        if count > self.remaining() || self.cursor > self.end {
            let err = DecodeError::Truncated {
                offset: self.cursor,
                needed: count,
                end: self.end,
            };
            return Err(self.fail(err));
        }
        let bytes = &self.bytes[self.cursor..self.cursor + count];
        self.cursor += count;
        Ok(bytes)
    }

    #[inline]
    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let bytes = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    // ---------------------------------------------------------------- varints

    /// Reads a varint of up to ten bytes as a split pair.
    ///
    /// The first four bytes fill 28 low bits, the fifth straddles both
    /// halves, and up to five more fill the high half. A continuation bit on
    /// the tenth byte is a malformed varint.
    pub fn read_split_varint64(&mut self) -> Result<SplitValue64, DecodeError> {
        let mut temp: u32 = 0x80;
        let mut lo: u32 = 0;
        let mut hi: u32 = 0;

        let mut i = 0;
        while i < 4 && temp >= 0x80 {
            temp = self.next_byte()? as u32;
            lo |= (temp & 0x7f) << (i * 7);
            i += 1;
        }
        if temp >= 0x80 {
            temp = self.next_byte()? as u32;
            lo |= (temp & 0x7f) << 28;
            hi |= (temp & 0x7f) >> 4;
        }
        if temp >= 0x80 {
            let mut i = 0;
            while i < 5 && temp >= 0x80 {
                temp = self.next_byte()? as u32;
                hi |= (temp & 0x7f) << (i * 7 + 3);
                i += 1;
            }
        }
        if temp < 0x80 {
            Ok(SplitValue64::new(lo, hi))
        } else {
            Err(self.fail(DecodeError::MalformedVarint))
        }
    }

    /// Reads a zigzag varint and decodes it to a two's-complement pair.
    pub fn read_split_zigzag_varint64(&mut self) -> Result<SplitValue64, DecodeError> {
        self.read_split_varint64().map(from_zigzag64)
    }

    /// Reads eight little-endian bytes as a split pair.
    pub fn read_split_fixed64(&mut self) -> Result<SplitValue64, DecodeError> {
        let lo = self.read_uint32()?;
        let hi = self.read_uint32()?;
        Ok(SplitValue64::new(lo, hi))
    }

    /// Skips one varint without decoding it.
    pub fn skip_varint(&mut self) -> Result<(), DecodeError> {
        for _ in 0..MAX_VARINT_LEN {
            if self.next_byte()? & 0x80 == 0 {
                return Ok(());
            }
        }
        Err(self.fail(DecodeError::MalformedVarint))
    }

    /// Moves the cursor back over the varint encoding of `value`.
    pub fn unskip_varint(&mut self, value: u32) {
        let mut value = value >> 7;
        let mut length = 1;
        while value != 0 {
            value >>= 7;
            length += 1;
        }
        self.cursor = self.cursor.saturating_sub(length);
    }

    /// Reads a varint that fits in 32 bits.
    ///
    /// Five bytes carry all 32 bits. Negative `int32` values are
    /// sign-extended to ten bytes on the wire, so up to five more
    /// continuation bytes are consumed and discarded.
    pub fn read_unsigned_varint32(&mut self) -> Result<u32, DecodeError> {
        let mut value: u32 = 0;
        for shift in [0, 7, 14, 21] {
            let x = self.next_byte()? as u32;
            value |= (x & 0x7f) << shift;
            if x < 0x80 {
                return Ok(value);
            }
        }
        let x = self.next_byte()? as u32;
        value |= (x & 0x0f) << 28;
        if x < 0x80 {
            return Ok(value);
        }
        for _ in 0..5 {
            if self.next_byte()? < 0x80 {
                return Ok(value);
            }
        }
        Err(self.fail(DecodeError::MalformedVarint))
    }

    /// Reads an `int32` varint; the two's-complement bit pattern is shared
    /// with the unsigned form.
    pub fn read_signed_varint32(&mut self) -> Result<i32, DecodeError> {
        self.read_unsigned_varint32().map(|v| v as i32)
    }

    pub fn read_unsigned_varint32_string(&mut self) -> Result<String, DecodeError> {
        self.read_unsigned_varint32().map(|v| v.to_string())
    }

    pub fn read_signed_varint32_string(&mut self) -> Result<String, DecodeError> {
        self.read_signed_varint32().map(|v| v.to_string())
    }

    pub fn read_zigzag_varint32(&mut self) -> Result<i32, DecodeError> {
        let n = self.read_unsigned_varint32()?;
        Ok(((n >> 1) as i32) ^ -((n & 1) as i32))
    }

    pub fn read_unsigned_varint64(&mut self) -> Result<u64, DecodeError> {
        self.read_split_varint64().map(join_uint64)
    }

    pub fn read_unsigned_varint64_string(&mut self) -> Result<String, DecodeError> {
        self.read_split_varint64().map(join_unsigned_decimal_string)
    }

    pub fn read_signed_varint64(&mut self) -> Result<i64, DecodeError> {
        self.read_split_varint64().map(join_int64)
    }

    pub fn read_signed_varint64_string(&mut self) -> Result<String, DecodeError> {
        self.read_split_varint64().map(join_signed_decimal_string)
    }

    pub fn read_zigzag_varint64(&mut self) -> Result<i64, DecodeError> {
        self.read_split_varint64().map(join_zigzag64)
    }

    pub fn read_zigzag_varint64_string(&mut self) -> Result<String, DecodeError> {
        self.read_split_zigzag_varint64().map(join_signed_decimal_string)
    }

    pub fn read_varint_hash64(&mut self) -> Result<Hash64, DecodeError> {
        self.read_split_varint64().map(Hash64::from_split)
    }

    /// Reads a zigzag varint and returns the decoded value's hash.
    pub fn read_zigzag_varint_hash64(&mut self) -> Result<Hash64, DecodeError> {
        self.read_split_zigzag_varint64().map(Hash64::from_split)
    }

    // ---------------------------------------------------------------- fixed width
    //
    // All fixed-width values are little-endian and fail with `Truncated` when
    // fewer bytes than their width remain.

    pub fn read_uint8(&mut self) -> Result<u8, DecodeError> {
        self.next_byte()
    }

    pub fn read_uint16(&mut self) -> Result<u16, DecodeError> {
        self.take_array().map(u16::from_le_bytes)
    }

    pub fn read_uint32(&mut self) -> Result<u32, DecodeError> {
        self.take_array().map(u32::from_le_bytes)
    }

    pub fn read_uint64(&mut self) -> Result<u64, DecodeError> {
        self.read_split_fixed64().map(join_uint64)
    }

    /// Reads eight bytes as an unsigned decimal string, exact beyond 2^53.
    pub fn read_uint64_string(&mut self) -> Result<String, DecodeError> {
        self.read_split_fixed64().map(join_unsigned_decimal_string)
    }

    pub fn read_int8(&mut self) -> Result<i8, DecodeError> {
        self.next_byte().map(|b| b as i8)
    }

    pub fn read_int16(&mut self) -> Result<i16, DecodeError> {
        self.take_array().map(i16::from_le_bytes)
    }

    pub fn read_int32(&mut self) -> Result<i32, DecodeError> {
        self.take_array().map(i32::from_le_bytes)
    }

    pub fn read_int64(&mut self) -> Result<i64, DecodeError> {
        self.read_split_fixed64().map(join_int64)
    }

    /// Signed counterpart of [`read_uint64_string`](Self::read_uint64_string).
    pub fn read_int64_string(&mut self) -> Result<String, DecodeError> {
        self.read_split_fixed64().map(join_signed_decimal_string)
    }

    /// Reads eight bytes verbatim as a hash.
    pub fn read_fixed_hash64(&mut self) -> Result<Hash64, DecodeError> {
        self.take_array().map(Hash64)
    }

    /// Reads IEEE-754 single-precision bits. NaN comes back as the canonical
    /// quiet NaN.
    pub fn read_float(&mut self) -> Result<f32, DecodeError> {
        self.read_uint32().map(|bits| join_float32(bits) as f32)
    }

    /// Reads IEEE-754 double-precision bits.
    pub fn read_double(&mut self) -> Result<f64, DecodeError> {
        self.read_split_fixed64().map(join_float64)
    }

    // ---------------------------------------------------------------- misc scalars

    /// Reads a varint-encoded boolean: any non-zero value is `true`.
    pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
        self.read_split_varint64().map(|v| !v.is_zero())
    }

    /// Reads an enum value as its raw number, known or not.
    pub fn read_enum(&mut self) -> Result<i32, DecodeError> {
        self.read_signed_varint32()
    }

    /// Reads `length` bytes as UTF-8 text, borrowed from the buffer.
    pub fn read_string(&mut self, length: usize) -> Result<&'a str, DecodeError> {
        let bytes = self.take(length)?;
        bytes_to_string(bytes).map_err(|_| DecodeError::InvalidUtf8)
    }

    /// Reads `length` raw bytes, borrowed from the buffer.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8], DecodeError> {
        self.take(length)
    }

    // ---------------------------------------------------------------- packed runs

    /// Reads a length varint, then decodes elements until the cursor reaches
    /// the end of that run.
    ///
    /// The window is narrowed to the run while elements are decoded, so an
    /// element that would cross the boundary fails with
    /// [`DecodeError::PackedOverrun`] instead of reading into the next field.
    /// With a fixed element `width`, a length that is not a whole number of
    /// elements fails with [`DecodeError::MisalignedPacked`] up front. A
    /// `width` of zero is a caller bug.
    pub fn read_packed<T>(
        &mut self,
        width: Option<usize>,
        mut decode: impl FnMut(&mut Self) -> Result<T, DecodeError>,
    ) -> Result<Vec<T>, DecodeError> {
        let length = self.read_unsigned_varint32()? as usize;
        if length > self.remaining() {
            let err = DecodeError::Truncated {
                offset: self.cursor,
                needed: length,
                end: self.end,
            };
            return Err(self.fail(err));
        }
        debug_assert_ne!(width, Some(0), "packed element width must be non-zero");
        if let Some(width) = width {
            if length.checked_rem(width) != Some(0) {
                return Err(self.fail(DecodeError::MisalignedPacked { length, width }));
            }
        }
        let run_end = self.cursor + length;
        let outer_end = self.end;
        self.end = run_end;
        let mut values = Vec::with_capacity(width.and_then(|w| length.checked_div(w)).unwrap_or(0));
        while self.cursor < run_end {
            match decode(self) {
                Ok(value) => values.push(value),
                Err(err) => {
                    self.end = outer_end;
                    return Err(match err {
                        DecodeError::Truncated { end, .. } if end == run_end => {
                            DecodeError::PackedOverrun
                        }
                        other => other,
                    });
                }
            }
        }
        self.end = outer_end;
        Ok(values)
    }
}
