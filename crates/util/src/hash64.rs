//! 8-byte hash form of 64-bit values.
//!
//! A [`Hash64`] carries the eight little-endian bytes of a 64-bit value. It is
//! the opaque transport form used for map keys and for fields whose numeric
//! interpretation the caller does not care about.

use std::fmt;

use thiserror::Error;

use crate::decimal::{
    join_signed_decimal_string, join_unsigned_decimal_string, split_decimal_string, DecimalError,
};
use crate::split64::SplitValue64;

/// Errors raised when parsing a `0x`-prefixed hex string into a hash.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HexError {
    #[error("expected \"0x\" followed by 16 hex digits, got {0} characters")]
    InvalidLength(usize),
    #[error("invalid hex digit {0:?}")]
    InvalidDigit(char),
}

/// Eight little-endian bytes of a 64-bit value.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash64(pub [u8; 8]);

impl Hash64 {
    pub const ZERO: Hash64 = Hash64([0; 8]);

    pub fn split(self) -> SplitValue64 {
        let b = self.0;
        SplitValue64 {
            lo: u32::from_le_bytes([b[0], b[1], b[2], b[3]]),
            hi: u32::from_le_bytes([b[4], b[5], b[6], b[7]]),
        }
    }

    pub fn from_split(value: SplitValue64) -> Self {
        let lo = value.lo.to_le_bytes();
        let hi = value.hi.to_le_bytes();
        Hash64([lo[0], lo[1], lo[2], lo[3], hi[0], hi[1], hi[2], hi[3]])
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

impl From<SplitValue64> for Hash64 {
    fn from(value: SplitValue64) -> Self {
        Hash64::from_split(value)
    }
}

impl fmt::Debug for Hash64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash64({})", hash64_to_hex_string(*self))
    }
}

/// Parses decimal text into a hash.
///
/// Runs the `result = result * 10 + digit` accumulation over an 8-byte
/// little-endian accumulator, carrying byte to byte; a leading `-` negates the
/// accumulated bytes in two's complement, so negative text must fit in an
/// `int64`.
///
/// # Example
///
/// ```
/// use protowire_util::{decimal_string_to_hash64, Hash64};
///
/// assert_eq!(decimal_string_to_hash64("1"), Ok(Hash64([1, 0, 0, 0, 0, 0, 0, 0])));
/// assert_eq!(decimal_string_to_hash64("-1"), Ok(Hash64([0xff; 8])));
/// ```
pub fn decimal_string_to_hash64(dec: &str) -> Result<Hash64, DecimalError> {
    let (negative, digits) = match dec.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, dec),
    };
    if digits.is_empty() {
        return Err(DecimalError::Empty);
    }
    let mut bytes = [0u8; 8];

    // Multiplies the accumulator by `m` and adds `c`, propagating carries.
    fn muladd(bytes: &mut [u8; 8], m: u32, mut c: u32) -> bool {
        for byte in bytes.iter_mut() {
            let r = m * *byte as u32 + c;
            *byte = (r & 0xff) as u8;
            c = r >> 8;
        }
        c == 0
    }

    for ch in digits.chars() {
        let digit = ch.to_digit(10).ok_or(DecimalError::InvalidDigit(ch))?;
        if !muladd(&mut bytes, 10, digit) {
            return Err(DecimalError::Overflow);
        }
    }
    if negative {
        if bytes[7] > 0x80 || (bytes[7] == 0x80 && bytes[..7].iter().any(|&b| b != 0)) {
            return Err(DecimalError::Overflow);
        }
        for byte in bytes.iter_mut() {
            *byte = !*byte;
        }
        // Wrapping is intended: -0 stays 0.
        muladd(&mut bytes, 1, 1);
    }
    Ok(Hash64(bytes))
}

/// Renders a hash as decimal text, signed or unsigned.
pub fn hash64_to_decimal_string(hash: Hash64, signed: bool) -> String {
    if signed {
        join_signed_decimal_string(hash.split())
    } else {
        join_unsigned_decimal_string(hash.split())
    }
}

/// Renders a hash as `0x` followed by 16 hex digits, most significant first.
pub fn hash64_to_hex_string(hash: Hash64) -> String {
    let mut out = String::with_capacity(18);
    out.push_str("0x");
    for byte in hash.0.iter().rev() {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Parses the output of [`hash64_to_hex_string`].
pub fn hex_string_to_hash64(hex: &str) -> Result<Hash64, HexError> {
    let digits = match hex.strip_prefix("0x") {
        Some(digits) if digits.len() == 16 => digits,
        _ => return Err(HexError::InvalidLength(hex.chars().count())),
    };
    let mut bytes = [0u8; 8];
    let mut chars = digits.chars();
    for i in (0..8).rev() {
        let mut byte = 0u8;
        for _ in 0..2 {
            // Length was checked in bytes; a multi-byte char fails here.
            let c = chars.next().ok_or(HexError::InvalidLength(hex.len()))?;
            let nibble = c.to_digit(16).ok_or(HexError::InvalidDigit(c))?;
            byte = (byte << 4) | nibble as u8;
        }
        bytes[i] = byte;
    }
    Ok(Hash64(bytes))
}

/// Parses decimal text into a hash via the split-pair parser. Agrees with
/// [`decimal_string_to_hash64`]; exposed for callers that already hold pairs.
pub fn split_decimal_to_hash64(dec: &str) -> Result<Hash64, DecimalError> {
    split_decimal_string(dec).map(Hash64::from_split)
}
