//! Caller-owned pools of reusable decoders, readers and writers.
//!
//! A pool is a plain value: it is not shared between threads and holds no
//! global state. Instances are fully reset when they are returned, so a
//! recycled decoder never carries a stale error flag into a fresh decode.

use crate::decoder::Decoder;
use crate::reader::Reader;
use crate::writer::Writer;

/// Number of idle instances a pool keeps by default.
pub const DEFAULT_POOL_CAPACITY: usize = 100;

#[derive(Debug, Clone)]
pub struct PoolOptions {
    /// Idle instances kept; anything freed beyond this is dropped.
    pub capacity: usize,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_POOL_CAPACITY,
        }
    }
}

/// Types that can be wiped back to their freshly constructed state.
pub trait Recycle {
    fn recycle(&mut self);
}

impl Recycle for Decoder<'_> {
    fn recycle(&mut self) {
        self.clear();
    }
}

impl Recycle for Reader<'_> {
    fn recycle(&mut self) {
        self.clear();
    }
}

impl Recycle for Writer {
    fn recycle(&mut self) {
        self.reset();
    }
}

/// A bounded free list.
#[derive(Debug)]
pub struct Pool<T> {
    idle: Vec<T>,
    capacity: usize,
}

pub type DecoderPool<'a> = Pool<Decoder<'a>>;
pub type ReaderPool<'a> = Pool<Reader<'a>>;
pub type WriterPool = Pool<Writer>;

impl<T: Recycle + Default> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Recycle + Default> Pool<T> {
    pub fn new() -> Self {
        Self::with_options(PoolOptions::default())
    }

    pub fn with_options(options: PoolOptions) -> Self {
        Self {
            idle: Vec::new(),
            capacity: options.capacity,
        }
    }

    /// Number of idle instances.
    pub fn len(&self) -> usize {
        self.idle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idle.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Takes an idle instance, or builds a new one.
    pub fn take(&mut self) -> T {
        self.idle.pop().unwrap_or_default()
    }

    /// Resets `item` and keeps it for reuse if there is room.
    pub fn put(&mut self, mut item: T) {
        item.recycle();
        if self.idle.len() >= self.capacity {
            tracing::trace!(capacity = self.capacity, "pool full, dropping instance");
            return;
        }
        self.idle.push(item);
    }
}

impl<'a> Pool<Decoder<'a>> {
    /// Takes a decoder and binds it to the whole of `bytes`.
    pub fn alloc(&mut self, bytes: &'a [u8]) -> Decoder<'a> {
        let mut decoder = self.take();
        decoder.set_block(bytes, 0, bytes.len());
        decoder
    }

    pub fn free(&mut self, decoder: Decoder<'a>) {
        self.put(decoder);
    }
}

impl<'a> Pool<Reader<'a>> {
    /// Takes a reader and binds it to the whole of `bytes`.
    pub fn alloc(&mut self, bytes: &'a [u8]) -> Reader<'a> {
        let mut reader = self.take();
        reader.set_block(bytes, 0, bytes.len());
        reader
    }

    pub fn free(&mut self, reader: Reader<'a>) {
        self.put(reader);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;
    use crate::reader::ReaderState;

    #[test]
    fn test_freed_decoder_is_reset() {
        let bad = [0xffu8; 11];
        let good = [0x2a];
        let mut pool = DecoderPool::new();

        let mut decoder = pool.alloc(&bad);
        assert_eq!(decoder.read_split_varint64(), Err(DecodeError::MalformedVarint));
        pool.free(decoder);
        assert_eq!(pool.len(), 1);

        let mut decoder = pool.alloc(&good);
        assert!(!decoder.has_error());
        assert_eq!(decoder.read_unsigned_varint32(), Ok(42));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_freed_reader_is_reset() {
        let bad = [0x0f];
        let good = [0x08, 0x01];
        let mut pool = ReaderPool::new();

        let mut reader = pool.alloc(&bad);
        reader.set_recursion_limit(1);
        assert!(reader.next_field().is_err());
        pool.free(reader);

        let mut reader = pool.alloc(&good);
        assert_eq!(reader.state(), ReaderState::BeforeFirstField);
        assert_eq!(reader.recursion_limit(), crate::DEFAULT_RECURSION_LIMIT);
        assert_eq!(reader.field_number(), 0);
        assert_eq!(reader.next_field(), Ok(true));
    }

    #[test]
    fn test_capacity() {
        let mut pool = WriterPool::with_options(PoolOptions { capacity: 1 });
        pool.put(Writer::new());
        pool.put(Writer::new());
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.capacity(), 1);

        let mut writer = pool.take();
        writer.write_int32(1, 1);
        pool.put(writer);
        assert_eq!(pool.take().length(), 0);
    }

    #[test]
    fn test_default_capacity() {
        let pool: DecoderPool<'_> = Pool::default();
        assert_eq!(pool.capacity(), DEFAULT_POOL_CAPACITY);
    }
}
