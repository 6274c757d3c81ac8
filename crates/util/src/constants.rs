//! Numeric constants used by the split arithmetic.

pub const TWO_TO_23: f64 = 8_388_608.0;
pub const TWO_TO_32: f64 = 4_294_967_296.0;
pub const TWO_TO_52: f64 = 4_503_599_627_370_496.0;

/// Smallest positive normal float32.
pub const FLOAT32_MIN: f64 = 1.1754943508222875e-38;
/// Largest finite float32.
pub const FLOAT32_MAX: f64 = 3.4028234663852886e38;
/// Smallest positive normal float64.
pub const FLOAT64_MIN: f64 = f64::MIN_POSITIVE;

/// Canonical quiet NaN bit patterns.
pub const FLOAT32_NAN_BITS: u32 = 0x7fc0_0000;
pub const FLOAT64_NAN_HIGH_BITS: u32 = 0x7ff8_0000;

/// Base used when rendering 64-bit values as decimal: each "digit" holds
/// seven decimal places and stays far below 2^53.
pub const DECIMAL_BASE: u64 = 10_000_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float32_limits_match_std() {
        assert_eq!(FLOAT32_MIN, f32::MIN_POSITIVE as f64);
        assert_eq!(FLOAT32_MAX, f32::MAX as f64);
        assert_eq!(TWO_TO_32, (1u64 << 32) as f64);
        assert_eq!(TWO_TO_52, (1u64 << 52) as f64);
    }
}
