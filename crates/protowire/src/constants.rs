//! Wire types, field types and numeric limits.

use std::convert::TryFrom;

/// How a field's value is framed on the wire (the low three bits of a tag).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    Delimited = 2,
    StartGroup = 3,
    EndGroup = 4,
    Fixed32 = 5,
}

impl TryFrom<u32> for WireType {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::Delimited),
            3 => Ok(WireType::StartGroup),
            4 => Ok(WireType::EndGroup),
            5 => Ok(WireType::Fixed32),
            other => Err(other),
        }
    }
}

/// Declared field types, as a schema names them.
///
/// `FixedHash64` and `VarintHash64` are 64-bit fields surfaced as
/// [`Hash64`](protowire_util::Hash64) instead of numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Double,
    Float,
    Int64,
    Uint64,
    Int32,
    Fixed64,
    Fixed32,
    Bool,
    String,
    Group,
    Message,
    Bytes,
    Uint32,
    Enum,
    Sfixed32,
    Sfixed64,
    Sint32,
    Sint64,
    FixedHash64,
    VarintHash64,
}

impl FieldType {
    /// The wire type a singular value of this field type is written with.
    pub fn wire_type(self) -> WireType {
        match self {
            FieldType::Int32
            | FieldType::Int64
            | FieldType::Uint32
            | FieldType::Uint64
            | FieldType::Sint32
            | FieldType::Sint64
            | FieldType::Bool
            | FieldType::Enum
            | FieldType::VarintHash64 => WireType::Varint,
            FieldType::Double | FieldType::Fixed64 | FieldType::Sfixed64 | FieldType::FixedHash64 => {
                WireType::Fixed64
            }
            FieldType::Float | FieldType::Fixed32 | FieldType::Sfixed32 => WireType::Fixed32,
            FieldType::String | FieldType::Bytes | FieldType::Message => WireType::Delimited,
            FieldType::Group => WireType::StartGroup,
        }
    }

    /// Whether repeated values of this type may use packed encoding.
    pub fn is_packable(self) -> bool {
        matches!(
            self.wire_type(),
            WireType::Varint | WireType::Fixed32 | WireType::Fixed64
        )
    }
}

/// Largest legal field number (2^29 - 1).
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// Longest varint a 64-bit value can need.
pub const MAX_VARINT_LEN: usize = 10;

/// Bytes written for a negative `int32`, sign-extended to 64 bits.
pub const NEGATIVE_INT32_VARINT_LEN: usize = 10;

/// Deepest nesting of groups and submessages a [`Reader`](crate::Reader)
/// accepts unless configured otherwise.
pub const DEFAULT_RECURSION_LIMIT: usize = 100;

/// Hash of the value zero.
pub const ZERO_HASH: protowire_util::Hash64 = protowire_util::Hash64::ZERO;
