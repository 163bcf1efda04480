//! SAM alignment flags.

use bitflags::bitflags;

bitflags! {
    /// SAM record flags (the `FLAG` field).
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
    pub struct Flags: u16 {
        /// The read is paired in sequencing.
        const PAIRED = 0x1;
        /// Each segment properly aligned according to the aligner.
        const PROPER_PAIR = 0x2;
        /// The read is unmapped.
        const UNMAPPED = 0x4;
        /// The mate is unmapped.
        const MATE_UNMAPPED = 0x8;
        /// The read is mapped to the reverse strand.
        const REVERSE = 0x10;
        /// The mate is mapped to the reverse strand.
        const MATE_REVERSE = 0x20;
        /// This is the first segment in the template.
        const FIRST_SEGMENT = 0x40;
        /// This is the last segment in the template.
        const LAST_SEGMENT = 0x80;
        /// A secondary alignment.
        const SECONDARY = 0x100;
        /// The read fails platform/vendor quality checks.
        const QC_FAIL = 0x200;
        /// The read is a PCR or optical duplicate.
        const DUPLICATE = 0x400;
        /// A supplementary alignment.
        const SUPPLEMENTARY = 0x800;
    }
}

impl Flags {
    /// Whether the read should be dropped at stream time per the filtering
    /// policy: unmapped, secondary, or supplementary reads carry no useful
    /// pileup information for the viewport.
    pub fn is_filtered_at_stream_time(self) -> bool {
        self.intersects(Self::UNMAPPED | Self::SECONDARY | Self::SUPPLEMENTARY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_filtered_at_stream_time() {
        assert!(Flags::UNMAPPED.is_filtered_at_stream_time());
        assert!(Flags::SECONDARY.is_filtered_at_stream_time());
        assert!(Flags::SUPPLEMENTARY.is_filtered_at_stream_time());
        assert!(!Flags::PAIRED.is_filtered_at_stream_time());
        assert!(!(Flags::PROPER_PAIR | Flags::REVERSE).is_filtered_at_stream_time());
    }
}
