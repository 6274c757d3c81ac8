//! Split pairs to and from decimal strings.

use thiserror::Error;

use crate::constants::DECIMAL_BASE;
use crate::split64::{join_uint64, SplitValue64};

/// Errors raised when parsing decimal text into a 64-bit value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecimalError {
    #[error("empty decimal string")]
    Empty,
    #[error("invalid decimal digit {0:?}")]
    InvalidDigit(char),
    #[error("decimal value does not fit in 64 bits")]
    Overflow,
    #[error("negative decimal value for an unsigned field")]
    Negative,
}

/// Renders a base-10,000,000 digit, zero-padded to seven places when it is
/// not the leading digit.
fn push_digit(out: &mut String, digit: u64, pad: bool) {
    if pad {
        out.push_str(&format!("{digit:07}"));
    } else if digit != 0 {
        out.push_str(&digit.to_string());
    }
}

/// Converts an unsigned split pair to its decimal string.
///
/// Values below 2^53 are formatted directly. Larger values are rebased into
/// three base-10^7 digits built from 24/24/16-bit slices of the pair, using
/// `2^24 = 1 * 10^7 + 6777216` and `2^48 = 28147497 * 10^7 + 6710656`.
///
/// # Example
///
/// ```
/// use protowire_util::{join_unsigned_decimal_string, SplitValue64};
///
/// let max = SplitValue64::new(u32::MAX, u32::MAX);
/// assert_eq!(join_unsigned_decimal_string(max), "18446744073709551615");
/// ```
pub fn join_unsigned_decimal_string(value: SplitValue64) -> String {
    if value.hi <= 0x1f_ffff {
        return join_uint64(value).to_string();
    }
    let low = (value.lo & 0xff_ffff) as u64;
    let mid = ((value.lo >> 24) | (value.hi << 8)) as u64 & 0xff_ffff;
    let high = ((value.hi >> 16) & 0xffff) as u64;

    let mut digit_a = low + mid * 6_777_216 + high * 6_710_656;
    let mut digit_b = mid + high * 8_147_497;
    let mut digit_c = high * 2;

    if digit_a >= DECIMAL_BASE {
        digit_b += digit_a / DECIMAL_BASE;
        digit_a %= DECIMAL_BASE;
    }
    if digit_b >= DECIMAL_BASE {
        digit_c += digit_b / DECIMAL_BASE;
        digit_b %= DECIMAL_BASE;
    }

    let mut out = String::with_capacity(20);
    push_digit(&mut out, digit_c, false);
    push_digit(&mut out, digit_b, digit_c != 0);
    push_digit(&mut out, digit_a, true);
    out
}

/// Converts a two's-complement split pair to its signed decimal string.
pub fn join_signed_decimal_string(value: SplitValue64) -> String {
    if value.is_negative() {
        let mut out = String::from("-");
        out.push_str(&join_unsigned_decimal_string(value.negate()));
        out
    } else {
        join_unsigned_decimal_string(value)
    }
}

/// Parses an optionally negative decimal string into a two's-complement pair.
///
/// Accumulates `result = result * 10 + digit` across the two halves with
/// explicit carry, then negates for a leading `-`. Positive text may use the
/// full unsigned range; negative text must fit in an `int64`.
///
/// ```
/// use protowire_util::{split_decimal_string, split_int64, DecimalError};
///
/// assert_eq!(split_decimal_string("-9223372036854775808"), Ok(split_int64(i64::MIN)));
/// assert_eq!(split_decimal_string("-9223372036854775809"), Err(DecimalError::Overflow));
/// ```
pub fn split_decimal_string(dec: &str) -> Result<SplitValue64, DecimalError> {
    let (negative, digits) = match dec.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, dec),
    };
    let magnitude = split_digits(digits)?;
    if !negative {
        return Ok(magnitude);
    }
    // |i64::MIN| = 2^63 is the largest magnitude a negative value may have.
    if magnitude.hi > 0x8000_0000 || (magnitude.hi == 0x8000_0000 && magnitude.lo != 0) {
        return Err(DecimalError::Overflow);
    }
    Ok(magnitude.negate())
}

/// Parses decimal text for an unsigned 64-bit field. A sign is rejected
/// rather than wrapped.
pub fn split_unsigned_decimal_string(dec: &str) -> Result<SplitValue64, DecimalError> {
    if dec.starts_with('-') {
        return Err(DecimalError::Negative);
    }
    split_digits(dec)
}

fn split_digits(digits: &str) -> Result<SplitValue64, DecimalError> {
    if digits.is_empty() {
        return Err(DecimalError::Empty);
    }
    let mut lo: u32 = 0;
    let mut hi: u32 = 0;
    for c in digits.chars() {
        let digit = c.to_digit(10).ok_or(DecimalError::InvalidDigit(c))?;
        let lo_product = lo as u64 * 10 + digit as u64;
        let hi_product = hi as u64 * 10 + (lo_product >> 32);
        if hi_product > u32::MAX as u64 {
            return Err(DecimalError::Overflow);
        }
        lo = lo_product as u32;
        hi = hi_product as u32;
    }
    Ok(SplitValue64::new(lo, hi))
}
