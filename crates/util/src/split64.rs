//! 64-bit values as `(lo, hi)` pairs of 32-bit halves.

/// A 64-bit quantity split into its low and high 32-bit halves.
///
/// Both halves are `u32`, so they are always masked to 32 bits.
///
/// # Example
///
/// ```
/// use protowire_util::{split_int64, SplitValue64};
///
/// assert_eq!(split_int64(-1), SplitValue64::new(0xffff_ffff, 0xffff_ffff));
/// assert_eq!(split_int64(1 << 32), SplitValue64::new(0, 1));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SplitValue64 {
    pub lo: u32,
    pub hi: u32,
}

impl SplitValue64 {
    pub const ZERO: SplitValue64 = SplitValue64 { lo: 0, hi: 0 };

    #[inline]
    pub const fn new(lo: u32, hi: u32) -> Self {
        Self { lo, hi }
    }

    /// Two's-complement negation: invert both halves, add one, carry into `hi`.
    #[inline]
    pub fn negate(self) -> Self {
        let lo = !self.lo;
        let hi = !self.hi;
        let (lo, carry) = lo.overflowing_add(1);
        let hi = if carry { hi.wrapping_add(1) } else { hi };
        Self { lo, hi }
    }

    /// Whether the sign bit is set when read as a signed value.
    #[inline]
    pub fn is_negative(self) -> bool {
        self.hi & 0x8000_0000 != 0
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.lo == 0 && self.hi == 0
    }

    /// Subtracts one, borrowing from `hi` when `lo` is zero.
    #[inline]
    fn decrement(self) -> Self {
        if self.lo == 0 {
            Self {
                lo: 0xffff_ffff,
                hi: self.hi.wrapping_sub(1),
            }
        } else {
            Self {
                lo: self.lo - 1,
                hi: self.hi,
            }
        }
    }
}

/// Splits an unsigned integer into halves.
#[inline]
pub fn split_uint64(value: u64) -> SplitValue64 {
    SplitValue64 {
        lo: value as u32,
        hi: (value >> 32) as u32,
    }
}

/// Splits a signed integer by sign and magnitude, negating the pair explicitly
/// for negative inputs.
pub fn split_int64(value: i64) -> SplitValue64 {
    let magnitude = split_uint64(value.unsigned_abs());
    if value < 0 {
        magnitude.negate()
    } else {
        magnitude
    }
}

/// Splits `value` already zigzag-encoded.
///
/// The magnitude is doubled with a carry-aware shift and, for negative
/// inputs, one is subtracted from the doubled pair. `|i64::MIN| * 2`
/// overflows 64 bits to zero, and the subtraction then wraps it to
/// `u64::MAX`, which is the correct zigzag image.
pub fn split_zigzag64(value: i64) -> SplitValue64 {
    let magnitude = split_uint64(value.unsigned_abs());
    let doubled = SplitValue64 {
        lo: magnitude.lo << 1,
        hi: (magnitude.hi << 1) | (magnitude.lo >> 31),
    };
    if value < 0 {
        doubled.decrement()
    } else {
        doubled
    }
}

/// Zigzag-encodes a two's-complement pair: `(n << 1) ^ (n >> 63)`.
#[inline]
pub fn to_zigzag64(value: SplitValue64) -> SplitValue64 {
    let sign = ((value.hi as i32) >> 31) as u32;
    SplitValue64 {
        lo: (value.lo << 1) ^ sign,
        hi: ((value.hi << 1) | (value.lo >> 31)) ^ sign,
    }
}

/// Decodes a zigzag pair back to two's complement: `(n >> 1) ^ -(n & 1)`.
#[inline]
pub fn from_zigzag64(value: SplitValue64) -> SplitValue64 {
    let sign = (value.lo & 1).wrapping_neg();
    SplitValue64 {
        lo: ((value.lo >> 1) | (value.hi << 31)) ^ sign,
        hi: (value.hi >> 1) ^ sign,
    }
}

#[inline]
pub fn join_uint64(value: SplitValue64) -> u64 {
    ((value.hi as u64) << 32) | value.lo as u64
}

#[inline]
pub fn join_int64(value: SplitValue64) -> i64 {
    join_uint64(value) as i64
}

/// Joins a zigzag-encoded pair into the signed value it represents.
#[inline]
pub fn join_zigzag64(value: SplitValue64) -> i64 {
    join_int64(from_zigzag64(value))
}
