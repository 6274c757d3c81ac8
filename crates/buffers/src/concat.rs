//! Byte block concatenation.

/// Flattens a block list followed by a live tail into one buffer.
///
/// `total` is the caller's running byte count; the result is allocated once
/// with exactly that capacity plus the tail.
///
/// # Example
///
/// ```
/// use protowire_buffers::concat_blocks;
///
/// let blocks = vec![vec![10, 2], vec![8, 1]];
/// assert_eq!(concat_blocks(&blocks, &[16, 2], 4), vec![10, 2, 8, 1, 16, 2]);
/// ```
pub fn concat_blocks(blocks: &[Vec<u8>], tail: &[u8], total: usize) -> Vec<u8> {
    let mut res = Vec::with_capacity(total + tail.len());
    for block in blocks {
        res.extend_from_slice(block);
    }
    res.extend_from_slice(tail);
    debug_assert_eq!(res.len(), total + tail.len());
    res
}
