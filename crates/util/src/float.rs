//! IEEE-754 bit splitting and joining.
//!
//! The exponent of a normal value is found by repeated halving or doubling
//! of the value, never with `log2`: `log2` rounds to the wrong integer right
//! at power-of-two boundaries. Every scaling step multiplies by a power of
//! two, so the search is exact.

use crate::constants::{
    FLOAT32_MAX, FLOAT32_MIN, FLOAT32_NAN_BITS, FLOAT64_MIN, FLOAT64_NAN_HIGH_BITS, TWO_TO_23,
    TWO_TO_32, TWO_TO_52,
};
use crate::split64::SplitValue64;

/// Exact power of two for exponents in the normal float64 range.
#[inline]
fn pow2(exp: i32) -> f64 {
    debug_assert!((-1022..=1023).contains(&exp));
    f64::from_bits(((exp + 1023) as u64) << 52)
}

/// Finds `exp` such that `1 <= value * 2^-exp < 2`, returning the scaled
/// mantissa alongside. `value` must be finite and positive.
fn normalize(mut value: f64) -> (f64, i32) {
    let mut exp = 0;
    let step = TWO_TO_32;
    while value >= step {
        value /= step;
        exp += 32;
    }
    while value >= 2.0 {
        value /= 2.0;
        exp += 1;
    }
    while value < 1.0 / step {
        value *= step;
        exp -= 32;
    }
    while value < 1.0 {
        value *= 2.0;
        exp -= 1;
    }
    (value, exp)
}

/// Rounds a non-negative value to the nearest integer, ties to even.
fn round_half_even(value: f64) -> f64 {
    let floor = value.floor();
    let diff = value - floor;
    if diff > 0.5 || (diff == 0.5 && floor % 2.0 != 0.0) {
        floor + 1.0
    } else {
        floor
    }
}

/// Encodes `value` as the bit pattern of the nearest float32.
///
/// Handles ±0, NaN (canonical quiet NaN), ±Infinity, overflow to infinity,
/// subnormals (scaled directly by the minimum exponent) and normals.
///
/// # Example
///
/// ```
/// use protowire_util::split_float32;
///
/// assert_eq!(split_float32(1.0), 0x3f80_0000);
/// assert_eq!(split_float32(-0.0), 0x8000_0000);
/// ```
pub fn split_float32(value: f64) -> u32 {
    if value.is_nan() {
        return FLOAT32_NAN_BITS;
    }
    let sign = (value.is_sign_negative() as u32) << 31;
    let value = value.abs();
    if value == 0.0 {
        return sign;
    }
    if value == f64::INFINITY {
        return sign | 0x7f80_0000;
    }
    if value < FLOAT32_MIN {
        // value * 2^149 is exact and lands in [0, 2^23); rounding up to 2^23
        // yields the smallest normal, which the same bit layout expresses.
        let mantissa = round_half_even(value * pow2(149)) as u32;
        return sign | mantissa;
    }
    if value > FLOAT32_MAX * 2.0 {
        return sign | 0x7f80_0000;
    }
    let (scaled, mut exp) = normalize(value);
    let mut mantissa = round_half_even((scaled - 1.0) * TWO_TO_23) as u32;
    if mantissa >= 0x80_0000 {
        mantissa = 0;
        exp += 1;
    }
    if exp > 127 {
        return sign | 0x7f80_0000;
    }
    sign | (((exp + 127) as u32) << 23) | mantissa
}

/// Decodes a float32 bit pattern to the exact double it denotes.
pub fn join_float32(bits: u32) -> f64 {
    let sign = if bits >> 31 != 0 { -1.0 } else { 1.0 };
    let exp = ((bits >> 23) & 0xff) as i32;
    let mantissa = (bits & 0x7f_ffff) as f64;
    match exp {
        0xff if mantissa != 0.0 => f64::NAN,
        0xff => sign * f64::INFINITY,
        0 => sign * mantissa * pow2(-149),
        _ => sign * (1.0 + mantissa / TWO_TO_23) * pow2(exp - 127),
    }
}

/// Encodes `value` as float64 bits, split into halves.
///
/// # Example
///
/// ```
/// use protowire_util::{split_float64, SplitValue64};
///
/// assert_eq!(split_float64(1.0), SplitValue64::new(0, 0x3ff0_0000));
/// ```
pub fn split_float64(value: f64) -> SplitValue64 {
    if value.is_nan() {
        return SplitValue64::new(0, FLOAT64_NAN_HIGH_BITS);
    }
    let sign = (value.is_sign_negative() as u32) << 31;
    let value = value.abs();
    if value == 0.0 {
        return SplitValue64::new(0, sign);
    }
    if value == f64::INFINITY {
        return SplitValue64::new(0, sign | 0x7ff0_0000);
    }
    if value < FLOAT64_MIN {
        // value * 2^1074 is an exact integer below 2^52.
        let mantissa = value * pow2(1022) * TWO_TO_52;
        let hi = (mantissa / TWO_TO_32).floor();
        let lo = mantissa - hi * TWO_TO_32;
        return SplitValue64::new(lo as u32, sign | hi as u32);
    }
    let (scaled, exp) = normalize(value);
    let fraction = (scaled - 1.0) * TWO_TO_52;
    let hi = (fraction / TWO_TO_32).floor();
    let lo = fraction - hi * TWO_TO_32;
    SplitValue64::new(
        lo as u32,
        sign | (((exp + 1023) as u32) << 20) | hi as u32,
    )
}

/// Decodes split float64 bits to the double they denote.
pub fn join_float64(value: SplitValue64) -> f64 {
    let sign = if value.hi >> 31 != 0 { -1.0 } else { 1.0 };
    let exp = ((value.hi >> 20) & 0x7ff) as i32;
    let mantissa = (value.hi & 0xf_ffff) as f64 * TWO_TO_32 + value.lo as f64;
    match exp {
        0x7ff if mantissa != 0.0 => f64::NAN,
        0x7ff => sign * f64::INFINITY,
        0 => sign * (mantissa / TWO_TO_52) * pow2(-1022),
        _ => sign * (1.0 + mantissa / TWO_TO_52) * pow2(exp - 1023),
    }
}
