//! Reconstructing per-base mismatches from an MD tag or a reference sequence.
//!
//! Three paths feed [`crate::record::AlignmentRecord::mismatches`], in
//! priority order: the MD-tag walk ([`from_md`]), the SEQ-vs-reference walk
//! ([`from_reference`]) used when no MD tag is present, and the CRAM
//! read-feature walk, which lives in the CRAM decoder itself since it runs
//! inline with record decoding rather than as a post-pass.

use crate::cigar::{Kind, Op};
use crate::record::Mismatch;

/// Builds the `alignToRead`/`alignToRef` index arrays used by [`from_md`]:
/// for each of the `alignLen` aligned bases (CIGAR `M`, `=`, or `X`), the
/// 0-based read position and 0-based reference offset (from `align_start`)
/// of that base.
fn build_alignment_index(cigar_ops: &[Op]) -> (Vec<usize>, Vec<i64>) {
    let mut align_to_read = Vec::new();
    let mut align_to_ref = Vec::new();

    let mut read_pos: usize = 0;
    let mut ref_offset: i64 = 0;

    for op in cigar_ops {
        match op.kind() {
            Kind::Match | Kind::SequenceMatch | Kind::SequenceMismatch => {
                for i in 0..op.len() as usize {
                    align_to_read.push(read_pos + i);
                    align_to_ref.push(ref_offset + i as i64);
                }
                read_pos += op.len() as usize;
                ref_offset += i64::from(op.len());
            }
            Kind::Insertion | Kind::SoftClip => {
                read_pos += op.len() as usize;
            }
            Kind::Deletion | Kind::Skip => {
                ref_offset += i64::from(op.len());
            }
            Kind::HardClip | Kind::Pad => {}
        }
    }

    (align_to_read, align_to_ref)
}

/// Resolves mismatches by walking an MD tag against the read sequence.
///
/// `align_start` is the record's 1-based leftmost mapped position. `seq` is
/// the (already uppercased) read sequence. `md` is the raw `MD:Z` tag value.
///
/// MD syntax: decimal run lengths of matches, interspersed with either a
/// single reference base (a mismatch, advancing one aligned position) or
/// `^` followed by one or more reference bases (a deletion, which does not
/// advance the aligned-base cursor).
pub fn from_md(align_start: i64, seq: &str, md: &str, cigar_ops: &[Op]) -> Vec<Mismatch> {
    let (align_to_read, align_to_ref) = build_alignment_index(cigar_ops);
    let seq: Vec<char> = seq.chars().collect();

    let mut mismatches = Vec::new();
    let mut align_idx: usize = 0;

    let chars: Vec<char> = md.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        if chars[i].is_ascii_digit() {
            let mut n: usize = 0;
            while i < chars.len() && chars[i].is_ascii_digit() {
                n = n * 10 + (chars[i] as usize - '0' as usize);
                i += 1;
            }
            align_idx += n;
        } else if chars[i] == '^' {
            i += 1;
            while i < chars.len() && chars[i].is_ascii_alphabetic() {
                i += 1;
            }
            // Deletions do not advance the aligned-base cursor.
        } else if chars[i].is_ascii_alphabetic() {
            if align_idx < align_to_ref.len() {
                let genomic_pos = align_start + align_to_ref[align_idx];
                let read_pos = align_to_read[align_idx];
                if let Some(&base) = seq.get(read_pos) {
                    mismatches.push(Mismatch::new(genomic_pos, base));
                }
            }
            align_idx += 1;
            i += 1;
        } else {
            // Unrecognized character; skip defensively rather than loop forever.
            i += 1;
        }
    }

    mismatches
}

/// Resolves mismatches by comparing the read sequence directly against
/// reference bases, used when no MD tag is available.
///
/// `reference` supplies uppercase reference bases for `[ref_start, ref_start
/// + reference.chars().count())`. Positions where either base is `N` are
/// never reported as mismatches.
pub fn from_reference(
    align_start: i64,
    seq: &str,
    cigar_ops: &[Op],
    ref_start: i64,
    reference: &str,
) -> Vec<Mismatch> {
    let seq: Vec<char> = seq.chars().collect();
    let reference: Vec<char> = reference.chars().collect();

    let mut mismatches = Vec::new();
    let mut read_pos: i64 = 0;
    let mut ref_pos: i64 = align_start;

    for op in cigar_ops {
        match op.kind() {
            Kind::Match | Kind::SequenceMatch | Kind::SequenceMismatch => {
                for k in 0..i64::from(op.len()) {
                    let r_idx = (ref_pos + k - ref_start) as usize;
                    let s_idx = (read_pos + k) as usize;

                    if let (Some(&rb), Some(&sb)) = (reference.get(r_idx), seq.get(s_idx)) {
                        let rb = rb.to_ascii_uppercase();
                        let sb = sb.to_ascii_uppercase();
                        if rb != sb && rb != 'N' && sb != 'N' {
                            mismatches.push(Mismatch::new(ref_pos + k, sb));
                        }
                    }
                }
                read_pos += i64::from(op.len());
                ref_pos += i64::from(op.len());
            }
            Kind::Insertion | Kind::SoftClip => {
                read_pos += i64::from(op.len());
            }
            Kind::Deletion | Kind::Skip => {
                ref_pos += i64::from(op.len());
            }
            Kind::HardClip | Kind::Pad => {}
        }
    }

    mismatches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cigar::Op;

    #[test]
    fn test_from_md_s2() {
        // S2: cigar = 5M, alignStart = 100, seq = ACGTA, MD = "2A2".
        // alignIdx=2 marks the reference base 'A' differing from read's 'G';
        // expected mismatch is (102, 'G').
        let ops = vec![Op::new(Kind::Match, 5)];
        let mismatches = from_md(100, "ACGTA", "2A2", &ops);
        assert_eq!(mismatches, vec![Mismatch::new(102, 'G')]);
    }

    #[test]
    fn test_from_md_with_deletion() {
        // 3M2D3M, seq = ACGTAC, MD = "3^GT3".
        let ops = vec![
            Op::new(Kind::Match, 3),
            Op::new(Kind::Deletion, 2),
            Op::new(Kind::Match, 3),
        ];
        let mismatches = from_md(100, "ACGTAC", "3^GT3", &ops);
        assert!(mismatches.is_empty());
    }

    #[test]
    fn test_from_md_mismatch_after_deletion() {
        let ops = vec![
            Op::new(Kind::Match, 3),
            Op::new(Kind::Deletion, 2),
            Op::new(Kind::Match, 3),
        ];
        // After the 3M and the deletion, one matching base then a mismatch 'C' -> read base at
        // align index 4 (5th aligned base overall) is seq[4] = 'A'.
        let mismatches = from_md(100, "ACGTAC", "3^GT1C1", &ops);
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].genomic_pos, 106);
    }

    #[test]
    fn test_from_reference_skips_n() {
        let ops = vec![Op::new(Kind::Match, 4)];
        let mismatches = from_reference(100, "ACNT", &ops, 100, "ACGN");
        // Position 102: read N vs ref G -> skipped (read is N).
        // Position 103: read T vs ref N -> skipped (ref is N).
        assert!(mismatches.is_empty());
    }

    #[test]
    fn test_from_reference_basic() {
        let ops = vec![Op::new(Kind::Match, 4)];
        let mismatches = from_reference(100, "ACGT", &ops, 100, "ACCT");
        assert_eq!(mismatches, vec![Mismatch::new(102, 'G')]);
    }

    #[test]
    fn test_from_reference_with_indels() {
        // 2M1I2M, read = AC|G|TT, ref at [100,104) = ACTT (no indel in ref).
        let ops = vec![
            Op::new(Kind::Match, 2),
            Op::new(Kind::Insertion, 1),
            Op::new(Kind::Match, 2),
        ];
        let mismatches = from_reference(100, "ACGTT", &ops, 100, "ACTT");
        assert!(mismatches.is_empty());
    }
}
