//! protowire-buffers - byte plumbing shared by the protowire codec.
//!
//! Normalizes the byte sources a caller may hand to a decoder, converts between
//! bytes and UTF-8 text, and concatenates the block lists produced by the
//! message writer.

mod byte_source;
mod concat;
pub mod utf8;

pub use byte_source::ByteSource;
pub use concat::concat_blocks;
pub use utf8::{bytes_to_string, utf16_to_utf8, utf8_len_of_utf16};

use thiserror::Error;

/// Errors raised while normalizing or interpreting raw bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("invalid UTF-8")]
    InvalidUtf8,
    #[error("invalid base64 text")]
    InvalidBase64,
}
