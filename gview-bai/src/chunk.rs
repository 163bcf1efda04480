//! A half-open interval of virtual offsets that may contain records for a
//! query.

use gview_bgzf::VirtualPosition;

/// Half-open interval `[start, end)` of virtual offsets.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Chunk {
    start: VirtualPosition,
    end: VirtualPosition,
}

impl Chunk {
    /// Creates a new chunk.
    pub fn new(start: VirtualPosition, end: VirtualPosition) -> Self {
        Self { start, end }
    }

    /// The inclusive start of the chunk.
    pub fn start(&self) -> VirtualPosition {
        self.start
    }

    /// The exclusive end of the chunk.
    pub fn end(&self) -> VirtualPosition {
        self.end
    }

    /// Whether this chunk overlaps `other`, including touching at an
    /// endpoint for the purposes of merging.
    pub fn overlaps_or_touches(&self, other: &Chunk) -> bool {
        other.start() <= self.end() && self.start() <= other.end()
    }
}
