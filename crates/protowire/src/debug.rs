//! Schema-less inspection of serialized messages.

use std::fmt::Write as _;

use crate::constants::{WireType, DEFAULT_RECURSION_LIMIT};
use crate::decoder::Decoder;
use crate::error::DecodeError;
use crate::reader::Reader;

#[derive(Debug, Clone)]
pub struct RawDumpOptions {
    /// Spaces per nesting level.
    pub indent: usize,
    /// Deepest nesting printed; delimited fields below it print as strings.
    /// Capped at [`DEFAULT_RECURSION_LIMIT`].
    pub max_depth: usize,
}

impl Default for RawDumpOptions {
    fn default() -> Self {
        Self {
            indent: 2,
            max_depth: 64,
        }
    }
}

/// Renders a serialized message without a schema, in the style of
/// `protoc --decode_raw`.
///
/// Varints print as unsigned decimals and fixed-width values as hex. A
/// delimited field prints as a nested message when its payload parses as
/// one, otherwise as a quoted, escaped string.
///
/// ```
/// use protowire::debug::{decode_raw, RawDumpOptions};
///
/// let text = decode_raw(&[0x08, 0x96, 0x01, 0x12, 0x02, b'h', b'i'], &RawDumpOptions::default());
/// assert_eq!(text.unwrap(), "1: 150\n2: \"hi\"\n");
/// ```
pub fn decode_raw(bytes: &[u8], options: &RawDumpOptions) -> Result<String, DecodeError> {
    let options = RawDumpOptions {
        max_depth: options.max_depth.min(DEFAULT_RECURSION_LIMIT),
        ..options.clone()
    };
    let mut out = String::new();
    let mut reader = Reader::new(bytes);
    dump_fields(&mut reader, &options, 0, None, &mut out)?;
    Ok(out)
}

fn pad(out: &mut String, options: &RawDumpOptions, depth: usize) {
    out.extend(std::iter::repeat(' ').take(options.indent * depth));
}

fn dump_fields(
    reader: &mut Reader<'_>,
    options: &RawDumpOptions,
    depth: usize,
    group: Option<u32>,
    out: &mut String,
) -> Result<(), DecodeError> {
    while reader.next_field()? {
        let field = reader.field_number();
        let Some(wire_type) = reader.wire_type() else {
            continue;
        };
        match wire_type {
            WireType::Varint => {
                pad(out, options, depth);
                let _ = writeln!(out, "{field}: {}", reader.read_uint64()?);
            }
            WireType::Fixed64 => {
                pad(out, options, depth);
                let _ = writeln!(out, "{field}: 0x{:016x}", reader.read_fixed64()?);
            }
            WireType::Fixed32 => {
                pad(out, options, depth);
                let _ = writeln!(out, "{field}: 0x{:08x}", reader.read_fixed32()?);
            }
            WireType::Delimited => {
                let payload = reader.read_bytes()?;
                pad(out, options, depth);
                if depth + 1 < options.max_depth && parses_as_message(payload) {
                    let _ = writeln!(out, "{field} {{");
                    dump_fields(&mut Reader::new(payload), options, depth + 1, None, out)?;
                    pad(out, options, depth);
                    out.push_str("}\n");
                } else {
                    let _ = writeln!(out, "{field}: \"{}\"", escape_bytes(payload));
                }
            }
            WireType::StartGroup => {
                if depth + 1 >= options.max_depth {
                    reader.skip_group()?;
                    pad(out, options, depth);
                    let _ = writeln!(out, "{field} {{ ... }}");
                    continue;
                }
                pad(out, options, depth);
                let _ = writeln!(out, "{field} {{");
                dump_fields(reader, options, depth + 1, Some(field), out)?;
                pad(out, options, depth);
                out.push_str("}\n");
            }
            WireType::EndGroup => {
                return match group {
                    Some(expected) if expected == field => Ok(()),
                    Some(expected) => Err(DecodeError::UnmatchedEndGroup {
                        expected,
                        found: field,
                    }),
                    None => Err(DecodeError::UnexpectedEndGroup(field)),
                };
            }
        }
    }
    match group {
        Some(field) => Err(DecodeError::UnmatchedStartGroup(field)),
        None => Ok(()),
    }
}

/// Whether `bytes` is a non-empty, well-formed sequence of fields.
fn parses_as_message(bytes: &[u8]) -> bool {
    if bytes.is_empty() {
        return false;
    }
    let mut reader = Reader::new(bytes);
    loop {
        match reader.next_field() {
            Ok(false) => return true,
            Ok(true) if reader.is_end_group() => return false,
            Ok(true) => {
                if reader.skip_field().is_err() {
                    return false;
                }
            }
            Err(_) => return false,
        }
    }
}

/// Quotes text the way protobuf text format does: valid UTF-8 stays
/// readable, everything else becomes octal escapes.
fn escape_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    match std::str::from_utf8(bytes) {
        Ok(text) => {
            for ch in text.chars() {
                match ch {
                    '"' => out.push_str("\\\""),
                    '\\' => out.push_str("\\\\"),
                    '\n' => out.push_str("\\n"),
                    '\r' => out.push_str("\\r"),
                    '\t' => out.push_str("\\t"),
                    c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                        let _ = write!(out, "\\{:03o}", c as u32);
                    }
                    c => out.push(c),
                }
            }
        }
        Err(_) => {
            for &byte in bytes {
                match byte {
                    b'"' => out.push_str("\\\""),
                    b'\\' => out.push_str("\\\\"),
                    0x20..=0x7e => out.push(byte as char),
                    _ => {
                        let _ = write!(out, "\\{byte:03o}");
                    }
                }
            }
        }
    }
    out
}

// ---------------------------------------------------------------- counting

/// Number of varints in a run of back-to-back varints, i.e. the number of
/// bytes without a continuation bit.
pub fn count_varints(bytes: &[u8]) -> usize {
    bytes.iter().filter(|&&b| b < 0x80).count()
}

fn count_run(
    bytes: &[u8],
    field: u32,
    wire_type: WireType,
    skip: impl Fn(&mut Decoder<'_>) -> Result<(), DecodeError>,
) -> usize {
    let tag = (field << 3) | wire_type as u32;
    let mut decoder = Decoder::new(bytes);
    let mut count = 0;
    while !decoder.at_end() {
        match decoder.read_unsigned_varint32() {
            Ok(found) if found == tag => {}
            _ => break,
        }
        if skip(&mut decoder).is_err() {
            break;
        }
        count += 1;
    }
    count
}

/// Counts consecutive varint entries for `field` at the start of `bytes`.
/// Useful for sizing a repeated field before reading it.
pub fn count_varint_fields(bytes: &[u8], field: u32) -> usize {
    count_run(bytes, field, WireType::Varint, |d| d.skip_varint())
}

pub fn count_fixed32_fields(bytes: &[u8], field: u32) -> usize {
    count_run(bytes, field, WireType::Fixed32, |d| d.read_bytes(4).map(|_| ()))
}

pub fn count_fixed64_fields(bytes: &[u8], field: u32) -> usize {
    count_run(bytes, field, WireType::Fixed64, |d| d.read_bytes(8).map(|_| ()))
}

pub fn count_delimited_fields(bytes: &[u8], field: u32) -> usize {
    count_run(bytes, field, WireType::Delimited, |d| {
        let length = d.read_unsigned_varint32()? as usize;
        d.read_bytes(length).map(|_| ())
    })
}
