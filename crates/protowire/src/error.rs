//! Codec error types.

use protowire_buffers::BufferError;
use protowire_util::DecimalError;
use thiserror::Error;

use crate::constants::{FieldType, WireType};

/// Fatal conditions hit while decoding.
///
/// Once a [`Decoder`](crate::Decoder) reports one of these, its sticky error
/// flag is set and every later read fails with [`DecodeError::Poisoned`].
/// Unknown field numbers and unknown enum values are not errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed varint: continuation bit still set after 10 bytes")]
    MalformedVarint,
    #[error("invalid wire type {0}")]
    InvalidWireType(u32),
    #[error("truncated input: {needed} byte(s) needed at offset {offset}, window ends at {end}")]
    Truncated {
        offset: usize,
        needed: usize,
        end: usize,
    },
    #[error("unmatched start-group tag for field {0}")]
    UnmatchedStartGroup(u32),
    #[error("unmatched end-group tag: expected field {expected}, found {found}")]
    UnmatchedEndGroup { expected: u32, found: u32 },
    #[error("expected wire type {expected:?}, found {found:?}")]
    WireTypeMismatch {
        expected: WireType,
        found: Option<WireType>,
    },
    #[error("end-group tag for field {0} outside any group")]
    UnexpectedEndGroup(u32),
    #[error("groups or submessages nested deeper than the limit of {0}")]
    RecursionLimit(usize),
    #[error("field number 0 is not allowed")]
    InvalidFieldNumber,
    #[error("packed field length {length} is not a multiple of element width {width}")]
    MisalignedPacked { length: usize, width: usize },
    #[error("packed elements overran the declared field length")]
    PackedOverrun,
    #[error("invalid UTF-8 in string field")]
    InvalidUtf8,
    #[error("decoder already failed; its position is unreliable")]
    Poisoned,
    #[error("field type {0:?} has no scalar value form")]
    UnsupportedFieldType(FieldType),
    #[error(transparent)]
    Source(#[from] BufferError),
}

/// Errors raised by writers that parse textual 64-bit values or take
/// dynamically typed values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error(transparent)]
    Decimal(#[from] DecimalError),
    #[error("field type {0:?} has no scalar value form")]
    UnsupportedFieldType(FieldType),
    #[error("value does not fit field type {0:?}")]
    ValueMismatch(FieldType),
}
