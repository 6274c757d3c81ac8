//! proto3 JSON mapping helpers.
//!
//! Generated code drives a [`JsonObjectWriter`] / [`JsonObjectReader`] per
//! message, field by field, the same way it drives the binary
//! [`Writer`](crate::Writer) / [`Reader`](crate::Reader). Scalar conversions
//! follow the canonical proto3 JSON rules: 64-bit integers are quoted,
//! bytes are standard base64, non-finite floats are the strings `"NaN"`,
//! `"Infinity"` and `"-Infinity"`, and numeric fields also accept their
//! quoted form on input.

use std::borrow::Cow;
use std::collections::HashSet;

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use serde_json::{Map, Number, Value};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JsonError {
    #[error("invalid JSON: {0}")]
    Syntax(String),
    #[error("expected a JSON object")]
    ExpectedObject,
    #[error("unknown field {0:?}")]
    UnknownField(String),
    #[error("field {field:?}: expected {expected}")]
    InvalidValue { field: String, expected: &'static str },
}

#[derive(Debug, Clone, Default)]
pub struct JsonWriteOptions {
    /// Write fields that hold their type's default value.
    pub emit_default_values: bool,
    /// Key fields by their `.proto` name instead of the lowerCamelCase JSON
    /// name.
    pub use_proto_field_name: bool,
}

#[derive(Debug, Clone, Default)]
pub struct JsonReadOptions {
    /// Silently drop keys that match no field.
    pub ignore_unknown_fields: bool,
}

/// Converts a `.proto` field name to its JSON name: underscores are dropped
/// and the letter after each one is upper-cased.
///
/// ```
/// use protowire::json::to_json_name;
///
/// assert_eq!(to_json_name("field_one"), "fieldOne");
/// assert_eq!(to_json_name("foo__bar_9"), "fooBar9");
/// ```
pub fn to_json_name(proto_name: &str) -> String {
    let mut out = String::with_capacity(proto_name.len());
    let mut capitalize_next = false;
    for ch in proto_name.chars() {
        if ch == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            out.extend(ch.to_uppercase());
            capitalize_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// The names a field can appear under in JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldNames<'n> {
    pub proto_name: &'n str,
    /// A `json_name` declared in the schema, if any.
    pub json_name: Option<&'n str>,
}

impl<'n> FieldNames<'n> {
    pub const fn new(proto_name: &'n str) -> Self {
        Self {
            proto_name,
            json_name: None,
        }
    }

    pub const fn with_json_name(proto_name: &'n str, json_name: &'n str) -> Self {
        Self {
            proto_name,
            json_name: Some(json_name),
        }
    }

    /// The key a writer emits under `options`.
    pub fn output_name(&self, options: &JsonWriteOptions) -> Cow<'n, str> {
        if options.use_proto_field_name {
            Cow::Borrowed(self.proto_name)
        } else if let Some(json_name) = self.json_name {
            Cow::Borrowed(json_name)
        } else {
            Cow::Owned(to_json_name(self.proto_name))
        }
    }

    /// Keys a reader accepts, in lookup order: camelCase name, `.proto`
    /// name, declared JSON name.
    pub fn candidates(&self) -> Vec<Cow<'n, str>> {
        let mut out: Vec<Cow<'n, str>> = Vec::with_capacity(3);
        out.push(Cow::Owned(to_json_name(self.proto_name)));
        if !out.iter().any(|n| n == self.proto_name) {
            out.push(Cow::Borrowed(self.proto_name));
        }
        if let Some(json_name) = self.json_name {
            if !out.iter().any(|n| n == json_name) {
                out.push(Cow::Borrowed(json_name));
            }
        }
        out
    }
}

// ---------------------------------------------------------------- scalars

/// A field value with a proto3 JSON form.
pub trait JsonScalar: Sized {
    /// Short description used in [`JsonError::InvalidValue`].
    const EXPECTED: &'static str;

    fn to_json(&self) -> Value;

    fn from_json(value: &Value) -> Option<Self>;

    fn is_default(&self) -> bool;
}

fn integral(value: &Value) -> Option<i128> {
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                Some(v as i128)
            } else if let Some(v) = n.as_u64() {
                Some(v as i128)
            } else {
                let f = n.as_f64()?;
                (f.fract() == 0.0 && f.abs() < 2f64.powi(64)).then_some(f as i128)
            }
        }
        Value::String(s) => s.trim().parse::<i128>().ok().or_else(|| {
            let f = s.trim().parse::<f64>().ok()?;
            (f.is_finite() && f.fract() == 0.0 && f.abs() < 2f64.powi(64)).then_some(f as i128)
        }),
        _ => None,
    }
}

impl JsonScalar for i32 {
    const EXPECTED: &'static str = "a 32-bit signed integer";

    fn to_json(&self) -> Value {
        Value::from(*self)
    }

    fn from_json(value: &Value) -> Option<Self> {
        integral(value).and_then(|v| i32::try_from(v).ok())
    }

    fn is_default(&self) -> bool {
        *self == 0
    }
}

impl JsonScalar for u32 {
    const EXPECTED: &'static str = "a 32-bit unsigned integer";

    fn to_json(&self) -> Value {
        Value::from(*self)
    }

    fn from_json(value: &Value) -> Option<Self> {
        integral(value).and_then(|v| u32::try_from(v).ok())
    }

    fn is_default(&self) -> bool {
        *self == 0
    }
}

impl JsonScalar for i64 {
    const EXPECTED: &'static str = "a 64-bit signed integer";

    fn to_json(&self) -> Value {
        Value::String(self.to_string())
    }

    fn from_json(value: &Value) -> Option<Self> {
        integral(value).and_then(|v| i64::try_from(v).ok())
    }

    fn is_default(&self) -> bool {
        *self == 0
    }
}

impl JsonScalar for u64 {
    const EXPECTED: &'static str = "a 64-bit unsigned integer";

    fn to_json(&self) -> Value {
        Value::String(self.to_string())
    }

    fn from_json(value: &Value) -> Option<Self> {
        integral(value).and_then(|v| u64::try_from(v).ok())
    }

    fn is_default(&self) -> bool {
        *self == 0
    }
}

fn float_to_json(value: f64) -> Value {
    if value.is_nan() {
        Value::String("NaN".into())
    } else if value == f64::INFINITY {
        Value::String("Infinity".into())
    } else if value == f64::NEG_INFINITY {
        Value::String("-Infinity".into())
    } else {
        Number::from_f64(value).map_or(Value::Null, Value::Number)
    }
}

fn float_from_json(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => match s.as_str() {
            "NaN" => Some(f64::NAN),
            "Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            other => other.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        },
        _ => None,
    }
}

impl JsonScalar for f64 {
    const EXPECTED: &'static str = "a double";

    fn to_json(&self) -> Value {
        float_to_json(*self)
    }

    fn from_json(value: &Value) -> Option<Self> {
        float_from_json(value)
    }

    fn is_default(&self) -> bool {
        *self == 0.0 && self.is_sign_positive()
    }
}

impl JsonScalar for f32 {
    const EXPECTED: &'static str = "a float";

    fn to_json(&self) -> Value {
        // Shortest decimal that round-trips as f32, not the widened f64.
        let widened = self.to_string().parse::<f64>().unwrap_or(*self as f64);
        float_to_json(widened)
    }

    fn from_json(value: &Value) -> Option<Self> {
        let v = float_from_json(value)?;
        if v.is_finite() && v.abs() > f32::MAX as f64 {
            return None;
        }
        Some(v as f32)
    }

    fn is_default(&self) -> bool {
        *self == 0.0 && self.is_sign_positive()
    }
}

impl JsonScalar for bool {
    const EXPECTED: &'static str = "a boolean";

    fn to_json(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_json(value: &Value) -> Option<Self> {
        value.as_bool()
    }

    fn is_default(&self) -> bool {
        !*self
    }
}

impl JsonScalar for String {
    const EXPECTED: &'static str = "a string";

    fn to_json(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_json(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_owned)
    }

    fn is_default(&self) -> bool {
        self.is_empty()
    }
}

impl JsonScalar for Vec<u8> {
    const EXPECTED: &'static str = "base64 text";

    fn to_json(&self) -> Value {
        Value::String(STANDARD.encode(self))
    }

    fn from_json(value: &Value) -> Option<Self> {
        let text = value.as_str()?;
        STANDARD
            .decode(text)
            .or_else(|_| URL_SAFE.decode(text))
            .ok()
    }

    fn is_default(&self) -> bool {
        self.is_empty()
    }
}

// ---------------------------------------------------------------- messages

/// A message with a proto3 JSON form.
pub trait JsonMessage: Sized {
    fn write_json(&self, writer: &mut JsonObjectWriter<'_>);

    fn read_json(reader: &mut JsonObjectReader<'_>) -> Result<Self, JsonError>;

    fn to_json_value(&self, options: &JsonWriteOptions) -> Value {
        let mut writer = JsonObjectWriter::new(options);
        self.write_json(&mut writer);
        writer.finish()
    }

    fn from_json_value(value: &Value, options: &JsonReadOptions) -> Result<Self, JsonError> {
        let mut reader = JsonObjectReader::new(value, options)?;
        let message = Self::read_json(&mut reader)?;
        reader.finish()?;
        Ok(message)
    }
}

/// Serializes `message` to a JSON string.
pub fn encode_json<M: JsonMessage>(message: &M, options: &JsonWriteOptions) -> String {
    message.to_json_value(options).to_string()
}

/// Parses a JSON string into `M`.
pub fn decode_json<M: JsonMessage>(json: &str, options: &JsonReadOptions) -> Result<M, JsonError> {
    let value: Value = serde_json::from_str(json).map_err(|e| JsonError::Syntax(e.to_string()))?;
    M::from_json_value(&value, options)
}

/// Builds one JSON object, applying casing and default omission.
#[derive(Debug)]
pub struct JsonObjectWriter<'o> {
    map: Map<String, Value>,
    options: &'o JsonWriteOptions,
}

impl<'o> JsonObjectWriter<'o> {
    pub fn new(options: &'o JsonWriteOptions) -> Self {
        Self {
            map: Map::new(),
            options,
        }
    }

    pub fn options(&self) -> &JsonWriteOptions {
        self.options
    }

    fn insert(&mut self, names: FieldNames<'_>, value: Value) {
        self.map
            .insert(names.output_name(self.options).into_owned(), value);
    }

    /// Writes an implicit-presence field; default values are omitted unless
    /// `emit_default_values` is set.
    pub fn field<T: JsonScalar>(&mut self, names: FieldNames<'_>, value: &T) {
        if value.is_default() && !self.options.emit_default_values {
            return;
        }
        self.insert(names, value.to_json());
    }

    /// Writes an explicit-presence field whenever it is set.
    pub fn optional_field<T: JsonScalar>(&mut self, names: FieldNames<'_>, value: Option<&T>) {
        match value {
            Some(value) => self.insert(names, value.to_json()),
            None if self.options.emit_default_values => self.insert(names, Value::Null),
            None => {}
        }
    }

    pub fn repeated_field<T: JsonScalar>(&mut self, names: FieldNames<'_>, values: &[T]) {
        if values.is_empty() && !self.options.emit_default_values {
            return;
        }
        let array = values.iter().map(T::to_json).collect();
        self.insert(names, Value::Array(array));
    }

    pub fn message_field<M: JsonMessage>(&mut self, names: FieldNames<'_>, value: Option<&M>) {
        match value {
            Some(message) => {
                let value = message.to_json_value(self.options);
                self.insert(names, value);
            }
            None if self.options.emit_default_values => self.insert(names, Value::Null),
            None => {}
        }
    }

    pub fn repeated_message_field<M: JsonMessage>(&mut self, names: FieldNames<'_>, values: &[M]) {
        if values.is_empty() && !self.options.emit_default_values {
            return;
        }
        let array = values
            .iter()
            .map(|message| message.to_json_value(self.options))
            .collect();
        self.insert(names, Value::Array(array));
    }

    /// Writes a map with string-rendered keys.
    pub fn map_field<'v, K: ToString, V: JsonScalar + 'v>(
        &mut self,
        names: FieldNames<'_>,
        entries: impl IntoIterator<Item = (K, &'v V)>,
    ) {
        let object: Map<String, Value> = entries
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.to_json()))
            .collect();
        if object.is_empty() && !self.options.emit_default_values {
            return;
        }
        self.insert(names, Value::Object(object));
    }

    pub fn finish(self) -> Value {
        Value::Object(self.map)
    }
}

/// Reads fields out of one JSON object and tracks which keys were used.
#[derive(Debug)]
pub struct JsonObjectReader<'v> {
    map: &'v Map<String, Value>,
    known: HashSet<&'v str>,
    options: &'v JsonReadOptions,
}

impl<'v> JsonObjectReader<'v> {
    pub fn new(value: &'v Value, options: &'v JsonReadOptions) -> Result<Self, JsonError> {
        let map = value.as_object().ok_or(JsonError::ExpectedObject)?;
        Ok(Self {
            map,
            known: HashSet::new(),
            options,
        })
    }

    /// Finds the field under the first matching key. Every alias present in
    /// the object is marked known. A JSON `null` reads as absent.
    fn lookup(&mut self, names: FieldNames<'_>) -> Option<(&'v str, &'v Value)> {
        let map = self.map;
        let mut found = None;
        for candidate in names.candidates() {
            if let Some((key, value)) = map.get_key_value(&*candidate) {
                self.known.insert(key.as_str());
                found.get_or_insert((key.as_str(), value));
            }
        }
        found.filter(|(_, value)| !value.is_null())
    }

    fn invalid(field: &str, expected: &'static str) -> JsonError {
        JsonError::InvalidValue {
            field: field.to_owned(),
            expected,
        }
    }

    pub fn field<T: JsonScalar>(&mut self, names: FieldNames<'_>) -> Result<Option<T>, JsonError> {
        match self.lookup(names) {
            None => Ok(None),
            Some((key, value)) => T::from_json(value)
                .map(Some)
                .ok_or_else(|| Self::invalid(key, T::EXPECTED)),
        }
    }

    pub fn repeated_field<T: JsonScalar>(
        &mut self,
        names: FieldNames<'_>,
    ) -> Result<Vec<T>, JsonError> {
        let Some((key, value)) = self.lookup(names) else {
            return Ok(Vec::new());
        };
        let array = value
            .as_array()
            .ok_or_else(|| Self::invalid(key, "an array"))?;
        array
            .iter()
            .map(|item| T::from_json(item).ok_or_else(|| Self::invalid(key, T::EXPECTED)))
            .collect()
    }

    pub fn message_field<M: JsonMessage>(
        &mut self,
        names: FieldNames<'_>,
    ) -> Result<Option<M>, JsonError> {
        match self.lookup(names) {
            None => Ok(None),
            Some((_, value)) => M::from_json_value(value, self.options).map(Some),
        }
    }

    pub fn repeated_message_field<M: JsonMessage>(
        &mut self,
        names: FieldNames<'_>,
    ) -> Result<Vec<M>, JsonError> {
        let Some((key, value)) = self.lookup(names) else {
            return Ok(Vec::new());
        };
        let array = value
            .as_array()
            .ok_or_else(|| Self::invalid(key, "an array"))?;
        array
            .iter()
            .map(|item| M::from_json_value(item, self.options))
            .collect()
    }

    /// Reads a map whose keys stay as their JSON strings.
    pub fn map_field<V: JsonScalar>(
        &mut self,
        names: FieldNames<'_>,
    ) -> Result<Vec<(String, V)>, JsonError> {
        let Some((key, value)) = self.lookup(names) else {
            return Ok(Vec::new());
        };
        let object = value
            .as_object()
            .ok_or_else(|| Self::invalid(key, "an object"))?;
        object
            .iter()
            .map(|(k, v)| {
                V::from_json(v)
                    .map(|v| (k.clone(), v))
                    .ok_or_else(|| Self::invalid(key, V::EXPECTED))
            })
            .collect()
    }

    /// Fails on the first key no field claimed, unless unknown fields are
    /// ignored.
    pub fn finish(self) -> Result<(), JsonError> {
        if self.options.ignore_unknown_fields {
            return Ok(());
        }
        match self.map.keys().find(|key| !self.known.contains(key.as_str())) {
            Some(key) => Err(JsonError::UnknownField(key.clone())),
            None => Ok(()),
        }
    }
}
