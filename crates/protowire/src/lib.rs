//! protowire - Protocol Buffers binary wire format.
//!
//! Layers, bottom up:
//!
//! - [`Decoder`] / [`Encoder`]: primitive values (varints, zigzag, fixed
//!   width, floats, strings) over a byte window or an append-only buffer.
//! - [`Reader`]: tag-by-tag field iteration, wire-type checks, skipping,
//!   nested messages and groups, packed and unpacked repeated fields.
//! - [`Writer`]: field serialization with deferred submessage lengths.
//! - [`Message`]: the interface generated message types implement.
//!
//! Lossless 64-bit helpers live in `protowire-util` and are re-exported
//! here; [`json`] carries the proto3 JSON mapping helpers and [`debug`] a
//! schema-less dump.
//!
//! # Example
//!
//! ```
//! use protowire::{Reader, Writer};
//!
//! let mut writer = Writer::new();
//! writer.write_int32(1, 3);
//! writer.write_packed_sint64(2, &[-1, 1]);
//! let bytes = writer.result_buffer();
//! assert_eq!(&bytes[..2], &[8, 3]);
//!
//! let mut reader = Reader::new(&bytes);
//! let mut values = Vec::new();
//! while reader.next_field().unwrap() {
//!     match reader.field_number() {
//!         2 => reader.read_repeated_sint64(&mut values).unwrap(),
//!         _ => reader.skip_field().unwrap(),
//!     }
//! }
//! assert_eq!(values, vec![-1, 1]);
//! ```

pub mod constants;
pub mod debug;
mod decoder;
mod encoder;
mod error;
pub mod json;
mod message;
pub mod pool;
mod reader;
mod value;
mod writer;

pub use constants::{FieldType, WireType, DEFAULT_RECURSION_LIMIT, MAX_FIELD_NUMBER};
pub use decoder::Decoder;
pub use encoder::{signed_varint32_len, varint_len, Encoder};
pub use error::{DecodeError, EncodeError};
pub use message::Message;
pub use pool::{DecoderPool, Pool, PoolOptions, ReaderPool, Recycle, WriterPool};
pub use reader::{Reader, ReaderState};
pub use value::ScalarValue;
pub use writer::{Bookmark, Writer};

pub use protowire_buffers::{BufferError, ByteSource};
pub use protowire_util::{
    decimal_string_to_hash64, hash64_to_decimal_string, hash64_to_hex_string,
    hex_string_to_hash64, DecimalError, Hash64, HexError, SplitValue64,
};
