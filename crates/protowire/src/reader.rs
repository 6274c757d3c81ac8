//! Field iteration over a [`Decoder`].

use protowire_util::{Hash64, SplitValue64};

use crate::constants::{FieldType, WireType, DEFAULT_RECURSION_LIMIT};
use crate::decoder::Decoder;
use crate::error::DecodeError;
use crate::value::ScalarValue;

/// Where a [`Reader`] stands in its field sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReaderState {
    #[default]
    BeforeFirstField,
    AtField {
        field: u32,
        wire_type: WireType,
    },
    EndOfStream,
    Errored,
}

/// Steps through the fields of a serialized message.
///
/// Generated decode code loops over [`next_field`](Self::next_field),
/// dispatches on [`field_number`](Self::field_number), calls the matching
/// `read_*` method, and hands everything else to
/// [`skip_field`](Self::skip_field).
///
/// # Example
///
/// ```
/// use protowire::Reader;
///
/// let bytes = [0x08, 0x03, 0x12, 0x02, b'h', b'i'];
/// let mut reader = Reader::new(&bytes);
/// let mut number = 0;
/// while reader.next_field().unwrap() {
///     match reader.field_number() {
///         1 => number = reader.read_int32().unwrap(),
///         _ => reader.skip_field().unwrap(),
///     }
/// }
/// assert_eq!(number, 3);
/// ```
///
/// Groups and submessages may nest at most
/// [`recursion_limit`](Self::recursion_limit) levels deep; going further
/// fails with [`DecodeError::RecursionLimit`].
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    decoder: Decoder<'a>,
    field_cursor: usize,
    state: ReaderState,
    depth: usize,
    recursion_limit: usize,
}

impl Default for Reader<'_> {
    fn default() -> Self {
        Self::from_decoder(Decoder::default())
    }
}

macro_rules! scalar_readers {
    ($($name:ident => $wire:ident, $decode:ident -> $ty:ty;)*) => {
        $(
            pub fn $name(&mut self) -> Result<$ty, DecodeError> {
                self.expect(WireType::$wire)?;
                self.decoder.$decode()
            }
        )*
    };
}

macro_rules! packed_readers {
    ($($name:ident => $decode:ident($ty:ty, $width:expr);)*) => {
        $(
            pub fn $name(&mut self) -> Result<Vec<$ty>, DecodeError> {
                self.expect(WireType::Delimited)?;
                self.decoder.read_packed($width, |d| d.$decode())
            }
        )*
    };
}

macro_rules! repeated_readers {
    ($($name:ident => $single:ident, $packed:ident($ty:ty);)*) => {
        $(
            /// Appends to `values`, accepting both the packed and the
            /// one-entry-per-element encoding.
            pub fn $name(&mut self, values: &mut Vec<$ty>) -> Result<(), DecodeError> {
                if self.is_delimited() {
                    values.extend(self.$packed()?);
                } else {
                    values.push(self.$single()?);
                }
                Ok(())
            }
        )*
    };
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self::from_decoder(Decoder::new(bytes))
    }

    pub fn with_window(bytes: &'a [u8], start: usize, length: usize) -> Self {
        Self::from_decoder(Decoder::with_window(bytes, start, length))
    }

    pub fn from_decoder(decoder: Decoder<'a>) -> Self {
        Self {
            field_cursor: decoder.cursor(),
            decoder,
            state: ReaderState::BeforeFirstField,
            depth: 0,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }

    /// Rebinds to a new window, clearing the error flag and field state.
    pub fn set_block(&mut self, bytes: &'a [u8], start: usize, length: usize) {
        self.decoder.set_block(bytes, start, length);
        self.field_cursor = self.decoder.cursor();
        self.state = ReaderState::BeforeFirstField;
        self.depth = 0;
    }

    /// Drops the buffer and all state, including a custom recursion limit.
    pub fn clear(&mut self) {
        self.decoder.clear();
        self.field_cursor = 0;
        self.state = ReaderState::BeforeFirstField;
        self.depth = 0;
        self.recursion_limit = DEFAULT_RECURSION_LIMIT;
    }

    /// Rewinds to the first field of the window.
    pub fn reset(&mut self) {
        self.decoder.reset();
        self.field_cursor = self.decoder.cursor();
        self.state = ReaderState::BeforeFirstField;
        self.depth = 0;
    }

    pub fn recursion_limit(&self) -> usize {
        self.recursion_limit
    }

    /// Sets how many groups and submessages may be open at once.
    pub fn set_recursion_limit(&mut self, limit: usize) {
        self.recursion_limit = limit;
    }

    /// Number of groups and submessages currently being read.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn decoder(&self) -> &Decoder<'a> {
        &self.decoder
    }

    pub fn decoder_mut(&mut self) -> &mut Decoder<'a> {
        &mut self.decoder
    }

    pub fn state(&self) -> ReaderState {
        if self.decoder.has_error() {
            ReaderState::Errored
        } else {
            self.state
        }
    }

    pub fn has_error(&self) -> bool {
        self.decoder.has_error()
    }

    pub fn cursor(&self) -> usize {
        self.decoder.cursor()
    }

    /// Offset of the current field's tag.
    pub fn field_cursor(&self) -> usize {
        self.field_cursor
    }

    pub fn at_end(&self) -> bool {
        self.decoder.at_end()
    }

    fn fail<T>(&mut self, err: DecodeError) -> Result<T, DecodeError> {
        self.state = ReaderState::Errored;
        Err(self.decoder.fail(err))
    }

    fn track<T>(&mut self, result: Result<T, DecodeError>) -> Result<T, DecodeError> {
        if result.is_err() {
            self.state = ReaderState::Errored;
        }
        result
    }

    /// Fails once `open` more nesting levels would exceed the limit.
    fn check_depth(&mut self, open: usize) -> Result<(), DecodeError> {
        if self.depth + open > self.recursion_limit {
            let limit = self.recursion_limit;
            return self.fail(DecodeError::RecursionLimit(limit));
        }
        Ok(())
    }

    // ---------------------------------------------------------------- iteration

    /// Reads the next tag.
    ///
    /// Returns `Ok(false)` at the end of the window. An invalid wire type, a
    /// zero field number or an earlier fatal error ends iteration with `Err`.
    pub fn next_field(&mut self) -> Result<bool, DecodeError> {
        if self.decoder.has_error() {
            self.state = ReaderState::Errored;
            return Err(DecodeError::Poisoned);
        }
        if self.decoder.at_end() {
            self.state = ReaderState::EndOfStream;
            return Ok(false);
        }
        self.field_cursor = self.decoder.cursor();
        let header = self.decoder.read_unsigned_varint32();
        let header = self.track(header)?;
        let field = header >> 3;
        let wire_type = match WireType::try_from(header & 0x7) {
            Ok(wire_type) => wire_type,
            Err(raw) => return self.fail(DecodeError::InvalidWireType(raw)),
        };
        if field == 0 {
            return self.fail(DecodeError::InvalidFieldNumber);
        }
        self.state = ReaderState::AtField { field, wire_type };
        Ok(true)
    }

    /// Current field number, or 0 when not positioned at a field.
    pub fn field_number(&self) -> u32 {
        match self.state {
            ReaderState::AtField { field, .. } => field,
            _ => 0,
        }
    }

    pub fn wire_type(&self) -> Option<WireType> {
        match self.state {
            ReaderState::AtField { wire_type, .. } => Some(wire_type),
            _ => None,
        }
    }

    /// Whether the current field is length-delimited; for a repeated scalar
    /// this means it arrived packed.
    pub fn is_delimited(&self) -> bool {
        self.wire_type() == Some(WireType::Delimited)
    }

    pub fn is_end_group(&self) -> bool {
        self.wire_type() == Some(WireType::EndGroup)
    }

    /// Fails with [`DecodeError::UnexpectedEndGroup`] when iteration stopped
    /// on an END_GROUP tag that closes nothing, e.g. at the top level of a
    /// message or inside a length-delimited one.
    pub fn reject_end_group(&mut self) -> Result<(), DecodeError> {
        if self.is_end_group() {
            let field = self.field_number();
            return self.fail(DecodeError::UnexpectedEndGroup(field));
        }
        Ok(())
    }

    /// Moves back so the next [`next_field`](Self::next_field) re-reads the
    /// current tag.
    pub fn unskip_header(&mut self) {
        self.decoder.set_cursor(self.field_cursor);
        self.state = ReaderState::BeforeFirstField;
    }

    fn expect(&self, expected: WireType) -> Result<(), DecodeError> {
        match self.wire_type() {
            Some(found) if found == expected => Ok(()),
            found => Err(DecodeError::WireTypeMismatch { expected, found }),
        }
    }

    // ---------------------------------------------------------------- skipping

    /// Skips the current field's value, whatever its wire type.
    pub fn skip_field(&mut self) -> Result<(), DecodeError> {
        match self.wire_type() {
            Some(WireType::Varint) => self.skip_varint_field(),
            Some(WireType::Fixed64) => self.skip_fixed64_field(),
            Some(WireType::Fixed32) => self.skip_fixed32_field(),
            Some(WireType::Delimited) => self.skip_delimited_field(),
            Some(WireType::StartGroup) => self.skip_group(),
            Some(WireType::EndGroup) => {
                let field = self.field_number();
                self.fail(DecodeError::UnexpectedEndGroup(field))
            }
            None => Err(DecodeError::WireTypeMismatch {
                expected: WireType::Varint,
                found: None,
            }),
        }
    }

    pub fn skip_varint_field(&mut self) -> Result<(), DecodeError> {
        self.expect(WireType::Varint)?;
        let result = self.decoder.skip_varint();
        self.track(result)
    }

    pub fn skip_delimited_field(&mut self) -> Result<(), DecodeError> {
        self.expect(WireType::Delimited)?;
        let result = self
            .decoder
            .read_unsigned_varint32()
            .and_then(|length| self.decoder.read_bytes(length as usize).map(|_| ()));
        self.track(result)
    }

    pub fn skip_fixed32_field(&mut self) -> Result<(), DecodeError> {
        self.expect(WireType::Fixed32)?;
        let result = self.decoder.read_bytes(4).map(|_| ());
        self.track(result)
    }

    pub fn skip_fixed64_field(&mut self) -> Result<(), DecodeError> {
        self.expect(WireType::Fixed64)?;
        let result = self.decoder.read_bytes(8).map(|_| ());
        self.track(result)
    }

    /// Skips a whole group, including nested groups, up to its matching
    /// END_GROUP tag.
    ///
    /// Nested groups are tracked on an explicit stack of open field numbers,
    /// so input depth never turns into call depth. The stack still counts
    /// toward the recursion limit.
    pub fn skip_group(&mut self) -> Result<(), DecodeError> {
        self.expect(WireType::StartGroup)?;
        let mut open = vec![self.field_number()];
        self.check_depth(open.len())?;
        while let Some(&innermost) = open.last() {
            if !self.next_field()? {
                return self.fail(DecodeError::UnmatchedStartGroup(innermost));
            }
            match self.wire_type() {
                Some(WireType::StartGroup) => {
                    open.push(self.field_number());
                    self.check_depth(open.len())?;
                }
                Some(WireType::EndGroup) => {
                    let found = self.field_number();
                    if found != innermost {
                        return self.fail(DecodeError::UnmatchedEndGroup {
                            expected: innermost,
                            found,
                        });
                    }
                    open.pop();
                }
                _ => self.skip_field()?,
            }
        }
        Ok(())
    }

    /// Skips the current field and every directly following field with the
    /// same number. Leaves the reader before the next different field.
    pub fn skip_matching_fields(&mut self) -> Result<(), DecodeError> {
        let field = self.field_number();
        self.unskip_header();
        while self.next_field()? {
            if self.field_number() != field {
                self.unskip_header();
                break;
            }
            self.skip_field()?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------- nesting

    /// Reads a length-delimited submessage into `target`.
    ///
    /// The window is narrowed to the submessage while `read` runs, so nested
    /// reads can never cross into sibling data. Afterwards the cursor sits
    /// right past the submessage whatever `read` consumed.
    pub fn read_message<M: ?Sized>(
        &mut self,
        target: &mut M,
        read: impl FnOnce(&mut M, &mut Reader<'a>) -> Result<(), DecodeError>,
    ) -> Result<(), DecodeError> {
        self.expect(WireType::Delimited)?;
        let length = self.decoder.read_unsigned_varint32();
        let length = self.track(length)? as usize;
        if length > self.decoder.remaining() {
            let offset = self.decoder.cursor();
            let end = self.decoder.end();
            return self.fail(DecodeError::Truncated {
                offset,
                needed: length,
                end,
            });
        }
        self.check_depth(1)?;
        let outer_state = self.state;
        let outer_end = self.decoder.end();
        let inner_end = self.decoder.cursor() + length;
        self.decoder.set_end(inner_end);
        self.depth += 1;
        let result = read(target, self);
        self.depth -= 1;
        self.decoder.set_end(outer_end);
        result?;
        self.reject_end_group()?;
        self.decoder.set_cursor(inner_end);
        self.state = outer_state;
        Ok(())
    }

    /// Reads a START_GROUP-delimited submessage into `target`. `read` must
    /// stop at the END_GROUP tag, which has to carry the same `field`.
    pub fn read_group<M: ?Sized>(
        &mut self,
        field: u32,
        target: &mut M,
        read: impl FnOnce(&mut M, &mut Reader<'a>) -> Result<(), DecodeError>,
    ) -> Result<(), DecodeError> {
        self.expect(WireType::StartGroup)?;
        self.check_depth(1)?;
        let outer_state = self.state;
        self.depth += 1;
        let result = read(target, self);
        self.depth -= 1;
        result?;
        if !self.is_end_group() {
            return self.fail(DecodeError::UnmatchedStartGroup(field));
        }
        let found = self.field_number();
        if found != field {
            return self.fail(DecodeError::UnmatchedEndGroup {
                expected: field,
                found,
            });
        }
        self.state = outer_state;
        Ok(())
    }

    /// Returns a decoder over the current delimited field's payload and moves
    /// past it.
    pub fn field_decoder(&mut self) -> Result<Decoder<'a>, DecodeError> {
        self.expect(WireType::Delimited)?;
        let length = self.decoder.read_unsigned_varint32();
        let length = self.track(length)? as usize;
        let start = self.decoder.cursor();
        let payload = self.decoder.read_bytes(length);
        self.track(payload)?;
        Ok(Decoder::with_window(self.decoder.buffer(), start, length))
    }

    /// Reads one synthetic map entry message. A missing key or value takes
    /// its type's default; unknown entry fields are skipped.
    pub fn read_map_entry<K: Default, V: Default>(
        &mut self,
        mut read_key: impl FnMut(&mut Reader<'a>) -> Result<K, DecodeError>,
        mut read_value: impl FnMut(&mut Reader<'a>) -> Result<V, DecodeError>,
    ) -> Result<(K, V), DecodeError> {
        let mut entry: (Option<K>, Option<V>) = (None, None);
        self.read_message(&mut entry, |entry, reader| {
            while reader.next_field()? {
                if reader.is_end_group() {
                    break;
                }
                match reader.field_number() {
                    1 => entry.0 = Some(read_key(reader)?),
                    2 => entry.1 = Some(read_value(reader)?),
                    _ => reader.skip_field()?,
                }
            }
            Ok(())
        })?;
        Ok((entry.0.unwrap_or_default(), entry.1.unwrap_or_default()))
    }

    // ---------------------------------------------------------------- scalars

    scalar_readers! {
        read_int32 => Varint, read_signed_varint32 -> i32;
        read_int64 => Varint, read_signed_varint64 -> i64;
        read_int64_string => Varint, read_signed_varint64_string -> String;
        read_uint32 => Varint, read_unsigned_varint32 -> u32;
        read_uint64 => Varint, read_unsigned_varint64 -> u64;
        read_uint64_string => Varint, read_unsigned_varint64_string -> String;
        read_sint32 => Varint, read_zigzag_varint32 -> i32;
        read_sint64 => Varint, read_zigzag_varint64 -> i64;
        read_sint64_string => Varint, read_zigzag_varint64_string -> String;
        read_bool => Varint, read_bool -> bool;
        read_enum => Varint, read_enum -> i32;
        read_split_varint64 => Varint, read_split_varint64 -> SplitValue64;
        read_split_zigzag_varint64 => Varint, read_split_zigzag_varint64 -> SplitValue64;
        read_varint_hash64 => Varint, read_varint_hash64 -> Hash64;
        read_sint_hash64 => Varint, read_zigzag_varint_hash64 -> Hash64;
        read_fixed32 => Fixed32, read_uint32 -> u32;
        read_sfixed32 => Fixed32, read_int32 -> i32;
        read_float => Fixed32, read_float -> f32;
        read_fixed64 => Fixed64, read_uint64 -> u64;
        read_fixed64_string => Fixed64, read_uint64_string -> String;
        read_sfixed64 => Fixed64, read_int64 -> i64;
        read_sfixed64_string => Fixed64, read_int64_string -> String;
        read_double => Fixed64, read_double -> f64;
        read_split_fixed64 => Fixed64, read_split_fixed64 -> SplitValue64;
        read_fixed_hash64 => Fixed64, read_fixed_hash64 -> Hash64;
    }

    /// Reads a string field, borrowed from the input.
    pub fn read_string(&mut self) -> Result<&'a str, DecodeError> {
        self.expect(WireType::Delimited)?;
        let length = self.decoder.read_unsigned_varint32()? as usize;
        self.decoder.read_string(length)
    }

    /// Reads a bytes field, borrowed from the input.
    pub fn read_bytes(&mut self) -> Result<&'a [u8], DecodeError> {
        self.expect(WireType::Delimited)?;
        let length = self.decoder.read_unsigned_varint32()? as usize;
        self.decoder.read_bytes(length)
    }

    /// Reads a scalar whose type is only known at runtime.
    pub fn read_any(&mut self, field_type: FieldType) -> Result<ScalarValue, DecodeError> {
        let value = match field_type {
            FieldType::Double => ScalarValue::Double(self.read_double()?),
            FieldType::Float => ScalarValue::Float(self.read_float()?),
            FieldType::Int32 => ScalarValue::Int32(self.read_int32()?),
            FieldType::Sint32 => ScalarValue::Int32(self.read_sint32()?),
            FieldType::Sfixed32 => ScalarValue::Int32(self.read_sfixed32()?),
            FieldType::Int64 => ScalarValue::Int64(self.read_int64()?),
            FieldType::Sint64 => ScalarValue::Int64(self.read_sint64()?),
            FieldType::Sfixed64 => ScalarValue::Int64(self.read_sfixed64()?),
            FieldType::Uint32 => ScalarValue::Uint32(self.read_uint32()?),
            FieldType::Fixed32 => ScalarValue::Uint32(self.read_fixed32()?),
            FieldType::Uint64 => ScalarValue::Uint64(self.read_uint64()?),
            FieldType::Fixed64 => ScalarValue::Uint64(self.read_fixed64()?),
            FieldType::Bool => ScalarValue::Bool(self.read_bool()?),
            FieldType::Enum => ScalarValue::Enum(self.read_enum()?),
            FieldType::String => ScalarValue::String(self.read_string()?.to_owned()),
            FieldType::Bytes => ScalarValue::Bytes(self.read_bytes()?.to_vec()),
            FieldType::FixedHash64 => ScalarValue::Hash(self.read_fixed_hash64()?),
            FieldType::VarintHash64 => ScalarValue::Hash(self.read_varint_hash64()?),
            FieldType::Group | FieldType::Message => {
                return Err(DecodeError::UnsupportedFieldType(field_type))
            }
        };
        Ok(value)
    }

    // ---------------------------------------------------------------- packed

    packed_readers! {
        read_packed_int32 => read_signed_varint32(i32, None);
        read_packed_int64 => read_signed_varint64(i64, None);
        read_packed_int64_string => read_signed_varint64_string(String, None);
        read_packed_uint32 => read_unsigned_varint32(u32, None);
        read_packed_uint64 => read_unsigned_varint64(u64, None);
        read_packed_uint64_string => read_unsigned_varint64_string(String, None);
        read_packed_sint32 => read_zigzag_varint32(i32, None);
        read_packed_sint64 => read_zigzag_varint64(i64, None);
        read_packed_sint64_string => read_zigzag_varint64_string(String, None);
        read_packed_bool => read_bool(bool, None);
        read_packed_enum => read_enum(i32, None);
        read_packed_varint_hash64 => read_varint_hash64(Hash64, None);
        read_packed_fixed32 => read_uint32(u32, Some(4));
        read_packed_sfixed32 => read_int32(i32, Some(4));
        read_packed_float => read_float(f32, Some(4));
        read_packed_fixed64 => read_uint64(u64, Some(8));
        read_packed_fixed64_string => read_uint64_string(String, Some(8));
        read_packed_sfixed64 => read_int64(i64, Some(8));
        read_packed_sfixed64_string => read_int64_string(String, Some(8));
        read_packed_double => read_double(f64, Some(8));
        read_packed_fixed_hash64 => read_fixed_hash64(Hash64, Some(8));
    }

    // ---------------------------------------------------------------- repeated

    repeated_readers! {
        read_repeated_int32 => read_int32, read_packed_int32(i32);
        read_repeated_int64 => read_int64, read_packed_int64(i64);
        read_repeated_int64_string => read_int64_string, read_packed_int64_string(String);
        read_repeated_uint32 => read_uint32, read_packed_uint32(u32);
        read_repeated_uint64 => read_uint64, read_packed_uint64(u64);
        read_repeated_uint64_string => read_uint64_string, read_packed_uint64_string(String);
        read_repeated_sint32 => read_sint32, read_packed_sint32(i32);
        read_repeated_sint64 => read_sint64, read_packed_sint64(i64);
        read_repeated_sint64_string => read_sint64_string, read_packed_sint64_string(String);
        read_repeated_bool => read_bool, read_packed_bool(bool);
        read_repeated_enum => read_enum, read_packed_enum(i32);
        read_repeated_fixed32 => read_fixed32, read_packed_fixed32(u32);
        read_repeated_sfixed32 => read_sfixed32, read_packed_sfixed32(i32);
        read_repeated_float => read_float, read_packed_float(f32);
        read_repeated_fixed64 => read_fixed64, read_packed_fixed64(u64);
        read_repeated_fixed64_string => read_fixed64_string, read_packed_fixed64_string(String);
        read_repeated_sfixed64 => read_sfixed64, read_packed_sfixed64(i64);
        read_repeated_sfixed64_string => read_sfixed64_string, read_packed_sfixed64_string(String);
        read_repeated_double => read_double, read_packed_double(f64);
        read_repeated_fixed_hash64 => read_fixed_hash64, read_packed_fixed_hash64(Hash64);
        read_repeated_varint_hash64 => read_varint_hash64, read_packed_varint_hash64(Hash64);
    }

    pub fn read_repeated_string(&mut self, values: &mut Vec<String>) -> Result<(), DecodeError> {
        values.push(self.read_string()?.to_owned());
        Ok(())
    }

    pub fn read_repeated_bytes(&mut self, values: &mut Vec<Vec<u8>>) -> Result<(), DecodeError> {
        values.push(self.read_bytes()?.to_vec());
        Ok(())
    }
}
