//! CIGAR operations and reference-span computation.

use std::fmt;

/// A single CIGAR operation kind, encoded as in the BAM/CRAM wire formats
/// (`M=0, I=1, D=2, N=3, S=4, H=5, P=6, ==7, X=8`).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Kind {
    /// Alignment match (sequence match or mismatch).
    Match,
    /// Insertion to the reference.
    Insertion,
    /// Deletion from the reference.
    Deletion,
    /// Skipped region from the reference (e.g. intron).
    Skip,
    /// Soft clip (clipped sequence present in `SEQ`).
    SoftClip,
    /// Hard clip (clipped sequence NOT present in `SEQ`).
    HardClip,
    /// Padding (silent deletion from padded reference).
    Pad,
    /// Sequence match.
    SequenceMatch,
    /// Sequence mismatch.
    SequenceMismatch,
}

impl Kind {
    /// Decodes a CIGAR op code (the low 4 bits of the packed `u32`).
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Match),
            1 => Some(Self::Insertion),
            2 => Some(Self::Deletion),
            3 => Some(Self::Skip),
            4 => Some(Self::SoftClip),
            5 => Some(Self::HardClip),
            6 => Some(Self::Pad),
            7 => Some(Self::SequenceMatch),
            8 => Some(Self::SequenceMismatch),
            _ => None,
        }
    }

    /// Returns the wire op code for this kind.
    pub fn code(self) -> u32 {
        match self {
            Self::Match => 0,
            Self::Insertion => 1,
            Self::Deletion => 2,
            Self::Skip => 3,
            Self::SoftClip => 4,
            Self::HardClip => 5,
            Self::Pad => 6,
            Self::SequenceMatch => 7,
            Self::SequenceMismatch => 8,
        }
    }

    /// The single-character CIGAR symbol, as in a textual CIGAR string.
    pub fn symbol(self) -> char {
        match self {
            Self::Match => 'M',
            Self::Insertion => 'I',
            Self::Deletion => 'D',
            Self::Skip => 'N',
            Self::SoftClip => 'S',
            Self::HardClip => 'H',
            Self::Pad => 'P',
            Self::SequenceMatch => '=',
            Self::SequenceMismatch => 'X',
        }
    }

    /// Whether this operation consumes reference sequence, i.e. is one of
    /// `{M, D, N, =, X}`.
    pub fn consumes_reference(self) -> bool {
        matches!(
            self,
            Self::Match | Self::Deletion | Self::Skip | Self::SequenceMatch | Self::SequenceMismatch
        )
    }

    /// Whether this operation consumes read (query) sequence.
    pub fn consumes_read(self) -> bool {
        matches!(
            self,
            Self::Match
                | Self::Insertion
                | Self::SoftClip
                | Self::SequenceMatch
                | Self::SequenceMismatch
        )
    }
}

/// A single `(op_len, kind)` CIGAR operation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Op {
    len: u32,
    kind: Kind,
}

impl Op {
    /// Creates a new CIGAR operation.
    pub fn new(kind: Kind, len: u32) -> Self {
        Self { len, kind }
    }

    /// Decodes a packed `(op_len << 4) | op_code` `u32`, as found in BAM records.
    pub fn from_packed(packed: u32) -> Option<Self> {
        let kind = Kind::from_code(packed & 0xf)?;
        let len = packed >> 4;
        Some(Self { len, kind })
    }

    /// Encodes this operation as a packed `u32`.
    pub fn to_packed(self) -> u32 {
        (self.len << 4) | self.kind.code()
    }

    /// The operation length.
    pub fn len(self) -> u32 {
        self.len
    }

    /// Whether the operation has zero length.
    pub fn is_empty(self) -> bool {
        self.len == 0
    }

    /// The operation kind.
    pub fn kind(self) -> Kind {
        self.kind
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.len, self.kind.symbol())
    }
}

/// Computes the reference span of a CIGAR, i.e. the number of reference
/// bases consumed by operations in `{M, D, N, =, X}`.
pub fn reference_span<I>(ops: I) -> u32
where
    I: IntoIterator<Item = Op>,
{
    ops.into_iter()
        .filter(|op| op.kind().consumes_reference())
        .map(Op::len)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_span() {
        // 10M3I5M, pos = 1000 -> end = 1015 (S3 from the design notes).
        let ops = [
            Op::new(Kind::Match, 10),
            Op::new(Kind::Insertion, 3),
            Op::new(Kind::Match, 5),
        ];
        assert_eq!(reference_span(ops), 15);
    }

    #[test]
    fn test_packed_round_trip() {
        let op = Op::new(Kind::Deletion, 7);
        let packed = op.to_packed();
        assert_eq!(Op::from_packed(packed), Some(op));
    }

    #[test]
    fn test_from_code_unknown() {
        assert_eq!(Kind::from_code(9), None);
    }
}
