//! The parsed BAI index and chunk-resolution query.

use std::collections::HashMap;

use gview_bgzf::VirtualPosition;

use crate::chunk::Chunk;
use crate::reg2bin::reg2bins;

/// Window width of the BAI linear index (16,384 bp).
pub const LINEAR_INDEX_WINDOW_SIZE: u64 = 16_384;

/// One reference sequence's entry in a BAI index: its bins and linear index.
#[derive(Clone, Debug, Default)]
pub struct ReferenceIndex {
    bins: HashMap<u32, Vec<Chunk>>,
    linear_index: Vec<VirtualPosition>,
}

impl ReferenceIndex {
    /// Creates a reference index entry from its parsed bins and linear index.
    pub fn new(bins: HashMap<u32, Vec<Chunk>>, linear_index: Vec<VirtualPosition>) -> Self {
        Self { bins, linear_index }
    }
}

/// A parsed BAI index: one [`ReferenceIndex`] per reference sequence, in
/// header order.
#[derive(Clone, Debug, Default)]
pub struct Index {
    references: Vec<ReferenceIndex>,
}

impl Index {
    /// Creates an index from its per-reference entries.
    pub fn new(references: Vec<ReferenceIndex>) -> Self {
        Self { references }
    }

    /// Resolves `[start, end)` (0-based, half-open) on reference `ref_id` to
    /// a minimal, sorted, non-overlapping list of chunks.
    ///
    /// Returns an empty list if `ref_id` is out of range.
    pub fn chunks(&self, ref_id: i32, start: i64, end: i64) -> Vec<Chunk> {
        let Some(reference) = usize::try_from(ref_id)
            .ok()
            .and_then(|i| self.references.get(i))
        else {
            return Vec::new();
        };

        let start_u32 = start.max(0) as u32;
        let end_u32 = end.max(0) as u32;

        let bin_ids = reg2bins(start_u32, end_u32);

        let mut candidates: Vec<Chunk> = bin_ids
            .into_iter()
            .filter_map(|bin| reference.bins.get(&bin))
            .flatten()
            .copied()
            .collect();

        let min_offset = reference
            .linear_index
            .get((start.max(0) as u64 / LINEAR_INDEX_WINDOW_SIZE) as usize)
            .copied()
            .unwrap_or(VirtualPosition::MIN);

        candidates.retain(|c| c.end() > min_offset);

        for c in &mut candidates {
            if c.start() < min_offset {
                *c = Chunk::new(min_offset, c.end());
            }
        }

        candidates.sort_by_key(Chunk::start);

        merge(candidates)
    }
}

fn merge(chunks: Vec<Chunk>) -> Vec<Chunk> {
    let mut merged: Vec<Chunk> = Vec::with_capacity(chunks.len());

    for chunk in chunks {
        match merged.last_mut() {
            Some(last) if chunk.start() <= last.end() => {
                if chunk.end() > last.end() {
                    *last = Chunk::new(last.start(), chunk.end());
                }
            }
            _ => merged.push(chunk),
        }
    }

    merged
}
