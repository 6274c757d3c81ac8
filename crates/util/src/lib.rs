//! protowire-util - lossless 64-bit arithmetic on 32-bit halves.
//!
//! Every 64-bit quantity the codec touches (integers, zigzag values, the bit
//! pattern of a double) passes through a [`SplitValue64`]. The helpers here
//! convert between native numbers, split pairs, 8-byte hashes and decimal or
//! hex strings without ever leaving 32-bit-safe operations for the core math.

pub mod constants;
pub mod decimal;
pub mod float;
pub mod hash64;
pub mod split64;

pub use decimal::{
    join_signed_decimal_string, join_unsigned_decimal_string, split_decimal_string,
    split_unsigned_decimal_string, DecimalError,
};
pub use float::{join_float32, join_float64, split_float32, split_float64};
pub use hash64::{
    decimal_string_to_hash64, hash64_to_decimal_string, hash64_to_hex_string,
    hex_string_to_hash64, split_decimal_to_hash64, Hash64, HexError,
};
pub use split64::{
    from_zigzag64, join_int64, join_uint64, join_zigzag64, split_int64, split_uint64,
    split_zigzag64, to_zigzag64, SplitValue64,
};
