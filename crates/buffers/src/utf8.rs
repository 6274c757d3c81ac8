//! UTF-8 helpers.
//!
//! Rust strings are already UTF-8, so `&str` payloads are copied byte for
//! byte. Text that arrives as UTF-16 code units is transcoded by hand so that
//! unpaired surrogates have a fixed, deterministic encoding: each one becomes
//! U+FFFD (`EF BF BD`).

use std::str;

use crate::BufferError;

const REPLACEMENT: [u8; 3] = [0xef, 0xbf, 0xbd];

/// Views `bytes` as UTF-8 text.
pub fn bytes_to_string(bytes: &[u8]) -> Result<&str, BufferError> {
    str::from_utf8(bytes).map_err(|_| BufferError::InvalidUtf8)
}

/// Number of UTF-8 bytes [`utf16_to_utf8`] will produce for `units`.
pub fn utf8_len_of_utf16(units: &[u16]) -> usize {
    let mut length = 0;
    let mut i = 0;
    while i < units.len() {
        let c = units[i];
        length += if c < 0x80 {
            1
        } else if c < 0x800 {
            2
        } else if is_high_surrogate(c) && units.get(i + 1).is_some_and(|&n| is_low_surrogate(n)) {
            i += 1;
            4
        } else {
            3
        };
        i += 1;
    }
    length
}

/// Transcodes UTF-16 code units into UTF-8, appending to `out`.
///
/// BMP characters take one to three bytes; a high surrogate followed by a low
/// surrogate is combined into one code point and takes four. Returns the
/// number of bytes appended.
pub fn utf16_to_utf8(units: &[u16], out: &mut Vec<u8>) -> usize {
    let start = out.len();
    let mut i = 0;
    while i < units.len() {
        let c = units[i] as u32;
        if c < 0x80 {
            out.push(c as u8);
        } else if c < 0x800 {
            out.push(((c >> 6) | 0xc0) as u8);
            out.push(((c & 0x3f) | 0x80) as u8);
        } else if is_high_surrogate(c as u16) {
            match units.get(i + 1) {
                Some(&low) if is_low_surrogate(low) => {
                    let cp = 0x10000 + ((c - 0xd800) << 10) + (low as u32 - 0xdc00);
                    out.push(((cp >> 18) | 0xf0) as u8);
                    out.push((((cp >> 12) & 0x3f) | 0x80) as u8);
                    out.push((((cp >> 6) & 0x3f) | 0x80) as u8);
                    out.push(((cp & 0x3f) | 0x80) as u8);
                    i += 1;
                }
                _ => out.extend_from_slice(&REPLACEMENT),
            }
        } else if is_low_surrogate(c as u16) {
            out.extend_from_slice(&REPLACEMENT);
        } else {
            out.push(((c >> 12) | 0xe0) as u8);
            out.push((((c >> 6) & 0x3f) | 0x80) as u8);
            out.push(((c & 0x3f) | 0x80) as u8);
        }
        i += 1;
    }
    out.len() - start
}

#[inline]
fn is_high_surrogate(c: u16) -> bool {
    (0xd800..=0xdbff).contains(&c)
}

#[inline]
fn is_low_surrogate(c: u16) -> bool {
    (0xdc00..=0xdfff).contains(&c)
}
