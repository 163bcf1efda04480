//! A single CRAI index line.

/// Reference sequence id meaning "multi-reference slice" (records span more
/// than one reference sequence).
pub const MULTI_REFERENCE: i32 = -2;
/// Reference sequence id meaning "unmapped records".
pub const UNMAPPED: i32 = -1;

/// One line of a CRAI index: the container/slice location for a span of a
/// reference sequence (or the unmapped/multi-ref pseudo-sequences).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Record {
    /// Reference sequence id, or [`UNMAPPED`]/[`MULTI_REFERENCE`].
    pub seq_id: i32,
    /// 1-based alignment start.
    pub alignment_start: i64,
    /// Alignment span in reference bases.
    pub alignment_span: i64,
    /// Byte offset of the containing CRAM container.
    pub container_offset: u64,
    /// Byte offset of the slice within the container's uncompressed data.
    pub slice_offset: u64,
    /// Size in bytes of the slice.
    pub slice_size: u64,
}

impl Record {
    /// The record's end position, exclusive (`alignment_start +
    /// alignment_span`).
    pub fn alignment_end(&self) -> i64 {
        self.alignment_start + self.alignment_span
    }

    /// Whether this record's span overlaps `[start, end)`.
    pub fn overlaps(&self, start: i64, end: i64) -> bool {
        self.alignment_start < end && start < self.alignment_end()
    }
}
