//! Dynamically typed scalar field values.

use protowire_util::Hash64;

use crate::constants::{FieldType, ZERO_HASH};

/// One decoded scalar, tagged by its Rust representation.
///
/// Used by [`Reader::read_any`](crate::Reader::read_any) and
/// [`Writer::write_any`](crate::Writer::write_any) when the field type is only
/// known at runtime, as with map entries or raw dumps.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Double(f64),
    Float(f32),
    Int32(i32),
    Int64(i64),
    Uint32(u32),
    Uint64(u64),
    Bool(bool),
    Enum(i32),
    String(String),
    Bytes(Vec<u8>),
    Hash(Hash64),
}

impl ScalarValue {
    /// The default value a field of `field_type` takes when absent.
    pub fn default_for(field_type: FieldType) -> Option<ScalarValue> {
        let value = match field_type {
            FieldType::Double => ScalarValue::Double(0.0),
            FieldType::Float => ScalarValue::Float(0.0),
            FieldType::Int32 | FieldType::Sint32 | FieldType::Sfixed32 => ScalarValue::Int32(0),
            FieldType::Int64 | FieldType::Sint64 | FieldType::Sfixed64 => ScalarValue::Int64(0),
            FieldType::Uint32 | FieldType::Fixed32 => ScalarValue::Uint32(0),
            FieldType::Uint64 | FieldType::Fixed64 => ScalarValue::Uint64(0),
            FieldType::Bool => ScalarValue::Bool(false),
            FieldType::Enum => ScalarValue::Enum(0),
            FieldType::String => ScalarValue::String(String::new()),
            FieldType::Bytes => ScalarValue::Bytes(Vec::new()),
            FieldType::FixedHash64 | FieldType::VarintHash64 => ScalarValue::Hash(ZERO_HASH),
            FieldType::Group | FieldType::Message => return None,
        };
        Some(value)
    }

    /// Whether this is the zero value of its kind.
    pub fn is_default(&self) -> bool {
        match self {
            ScalarValue::Double(v) => *v == 0.0 && v.is_sign_positive(),
            ScalarValue::Float(v) => *v == 0.0 && v.is_sign_positive(),
            ScalarValue::Int32(v) | ScalarValue::Enum(v) => *v == 0,
            ScalarValue::Int64(v) => *v == 0,
            ScalarValue::Uint32(v) => *v == 0,
            ScalarValue::Uint64(v) => *v == 0,
            ScalarValue::Bool(v) => !*v,
            ScalarValue::String(v) => v.is_empty(),
            ScalarValue::Bytes(v) => v.is_empty(),
            ScalarValue::Hash(v) => *v == ZERO_HASH,
        }
    }
}
