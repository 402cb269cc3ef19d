//! Chunk planning for ranged transfers.
//!
//! Splits one item of `size` bytes into `chunk_count` contiguous byte ranges.
//! Every chunk but the last has length `size / chunk_count`; the last one
//! runs to `size` and so absorbs the remainder. Boundaries are gap-free and
//! non-overlapping, so in-order concatenation reproduces the item exactly.

use crate::media::ByteRange;

/// Byte ranges for one item's transfer. Lives only as long as that transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlan {
    pub size: u64,
    pub chunk_size: u64,
    pub chunks: Vec<ByteRange>,
}

impl ChunkPlan {
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

/// Builds the chunk plan for `size` bytes split `chunk_count` ways.
///
/// When `size < chunk_count` the count is reduced to `size` so no chunk is
/// empty. Returns `None` for an empty item or a zero count; such items are
/// not chunkable and go single-stream.
pub fn plan_chunks(size: u64, chunk_count: usize) -> Option<ChunkPlan> {
    if size == 0 || chunk_count == 0 {
        return None;
    }
    let count = (chunk_count as u64).min(size);
    let chunk_size = size / count;

    let chunks = (0..count)
        .map(|i| ByteRange {
            start: i * chunk_size,
            end: if i + 1 == count { size } else { (i + 1) * chunk_size },
        })
        .collect();

    Some(ChunkPlan {
        size,
        chunk_size,
        chunks,
    })
}
