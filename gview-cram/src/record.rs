//! Per-record CRAM decoding: data-series pulls, the read-feature walk, and
//! construction of the normalized [`gview_core::AlignmentRecord`].

use bstr::ByteSlice;
use gview_core::cigar::Op;
use gview_core::error::Result;
use gview_core::{AlignmentRecord, Flags, Mismatch, ReferenceSource, SubstitutionMatrix, UNPACKED_ROW};

use crate::container::compression_header::CompressionHeader;
use crate::container::slice::Slice;

/// CRAM per-record flag bits (the `CF` series), per htslib's numbering.
mod cram_flags {
    pub const PRESERVE_QUAL_SCORES: i32 = 0x1;
    pub const DETACHED: i32 = 0x2;
    pub const HAS_MATE_DOWNSTREAM: i32 = 0x4;
    pub const NO_SEQ: i32 = 0x8;
}

/// State threaded across records within a single slice: the previous
/// record's alignment start, used when `AP` is delta-coded.
pub struct SliceDecodeState {
    prev_alignment_start: i64,
}

impl SliceDecodeState {
    /// Creates decode state anchored at the slice's own alignment start.
    pub fn new(slice: &Slice) -> Self {
        Self {
            prev_alignment_start: slice.header.align_start,
        }
    }
}

/// Decodes one CRAM record from `slice`'s CORE/EXTERNAL streams.
///
/// `reference` supplies reference bases for resolving substitution-feature
/// (`X`) mismatches; if it returns `None` for the needed span, substitution
/// features are still consumed (to stay positioned correctly) but contribute
/// no mismatch.
pub fn decode_record(
    slice: &mut Slice,
    header: &CompressionHeader,
    state: &mut SliceDecodeState,
    chrom: &str,
    reference: Option<&dyn ReferenceSource>,
) -> Result<AlignmentRecord> {
    let core = &mut slice.core;
    let externals = &mut slice.externals;

    let bam_flags = header.series(b"BF").decode_int(core, externals)?;
    let cram_flags = header.series(b"CF").decode_int(core, externals)?;

    let ref_id = if slice.header.is_multi_reference() {
        Some(header.series(b"RI").decode_int(core, externals)?)
    } else if slice.header.ref_seq_id >= 0 {
        Some(slice.header.ref_seq_id)
    } else {
        None
    };

    let read_length = header.series(b"RL").decode_int(core, externals)?;

    let ap = header.series(b"AP").decode_int(core, externals)?;
    let align_start = if header.preservation_map.ap_delta {
        state.prev_alignment_start + i64::from(ap)
    } else {
        i64::from(ap)
    };
    state.prev_alignment_start = align_start;

    let _read_group = header.series(b"RG").decode_int(core, externals)?;

    let mut read_name: Option<String> = None;
    if header.preservation_map.read_names_included {
        read_name = Some(decode_name(header, core, externals)?);
    }

    let detached = cram_flags & cram_flags::DETACHED != 0;
    let has_mate_downstream = cram_flags & cram_flags::HAS_MATE_DOWNSTREAM != 0;

    if detached {
        let _mate_flags = header.series(b"MF").decode_int(core, externals)?;
        if read_name.is_none() {
            read_name = Some(decode_name(header, core, externals)?);
        }
        let _mate_ref = header.series(b"NS").decode_int(core, externals)?;
        let _mate_pos = header.series(b"NP").decode_int(core, externals)?;
        let _template_size = header.series(b"TS").decode_int(core, externals)?;
    } else if has_mate_downstream {
        let _distance_to_next_fragment = header.series(b"NF").decode_int(core, externals)?;
    }

    let tl_idx = header.series(b"TL").decode_int(core, externals)? as usize;
    if let Some(entry) = header.preservation_map.tag_dictionary.get(tl_idx) {
        for &tag in entry {
            if let Some(encoding) = header.tag_encoding(tag) {
                // Tag values are read and discarded; only MD/NM-style
                // reconstruction from read features is in scope here.
                let _ = encoding
                    .decode_bytes(core, externals)
                    .or_else(|_| encoding.decode_int(core, externals).map(|_| Vec::new()));
            }
        }
    }

    let mut mismatches = Vec::new();
    let mut ref_span: i64 = i64::from(read_length.max(0));

    if cram_flags & cram_flags::NO_SEQ == 0 {
        let num_features = header.series(b"FN").decode_int(core, externals)?;
        let mut prev_feature_pos: i64 = 0;
        let mut ref_offset: i64 = 0;

        for _ in 0..num_features {
            let fc = header.series(b"FC").decode_int(core, externals)? as u8 as char;
            let fp = i64::from(header.series(b"FP").decode_int(core, externals)?);
            let feature_pos = prev_feature_pos + fp;
            prev_feature_pos = feature_pos;

            let genomic_pos = align_start + feature_pos - 1 + ref_offset;

            match fc {
                'B' => {
                    let base = header.series(b"BA").decode_int(core, externals)? as u8 as char;
                    let _quality = header.series(b"QS").decode_int(core, externals)?;
                    mismatches.push(Mismatch::new(genomic_pos, base));
                }
                'X' => {
                    let code = header.series(b"BS").decode_int(core, externals)? as u8;
                    if let Some(base) = resolve_substitution(
                        reference,
                        chrom,
                        genomic_pos,
                        code,
                        &header.preservation_map.substitution_matrix,
                    ) {
                        mismatches.push(Mismatch::new(genomic_pos, base));
                    }
                }
                'I' => {
                    let bytes = header.series(b"IN").decode_bytes(core, externals)?;
                    let len = bytes.len() as i64;
                    ref_span -= len;
                    ref_offset -= len;
                }
                'i' => {
                    let _base = header.series(b"BA").decode_int(core, externals)?;
                    ref_span -= 1;
                    ref_offset -= 1;
                }
                'D' => {
                    let dl = i64::from(header.series(b"DL").decode_int(core, externals)?);
                    ref_span += dl;
                    ref_offset += dl;
                }
                'N' => {
                    let rs = i64::from(header.series(b"RS").decode_int(core, externals)?);
                    ref_span += rs;
                    ref_offset += rs;
                }
                'S' => {
                    let bytes = header.series(b"SC").decode_bytes(core, externals)?;
                    let len = bytes.len() as i64;
                    ref_span -= len;
                    ref_offset -= len;
                }
                'H' => {
                    let _len = header.series(b"HC").decode_int(core, externals)?;
                }
                'P' => {
                    let _len = header.series(b"PD").decode_int(core, externals)?;
                }
                'Q' => {
                    let _quality = header.series(b"QS").decode_int(core, externals)?;
                }
                'q' => {
                    let _qualities = header.series(b"QQ").decode_bytes(core, externals)?;
                }
                'b' => {
                    let _bases = header.series(b"BB").decode_bytes(core, externals)?;
                    let _qualities = header.series(b"QQ").decode_bytes(core, externals)?;
                }
                _ => {
                    // Unknown feature code; nothing further to consume for
                    // codecs this decoder doesn't recognize.
                }
            }
        }
    }

    let mapq = header.series(b"MQ").decode_int(core, externals)? as u8;

    if cram_flags & cram_flags::PRESERVE_QUAL_SCORES != 0 {
        for _ in 0..read_length.max(0) {
            let _quality = header.series(b"QS").decode_int(core, externals)?;
        }
    }

    let end = align_start + ref_span.max(1);

    let record = AlignmentRecord {
        ref_id,
        pos: align_start,
        end,
        flag: Flags::from_bits_truncate(bam_flags as u16),
        mapq,
        read_length,
        cigar_ops: Vec::<Op>::new(),
        read_name: read_name.unwrap_or_default(),
        mismatches: Some(mismatches),
        seq: None,
        row: UNPACKED_ROW,
    };
    debug_assert!(record.check_invariants(), "decoded record violates its own pos/end/mismatch ordering invariants");
    Ok(record)
}

fn decode_name(
    header: &CompressionHeader,
    core: &mut crate::io::BitReader,
    externals: &mut std::collections::HashMap<i32, crate::codecs::byte_array::ByteStream>,
) -> Result<String> {
    let bytes = header.series(b"RN").decode_bytes(core, externals)?;
    Ok(bytes.to_str_lossy().into_owned())
}

fn resolve_substitution(
    reference: Option<&dyn ReferenceSource>,
    chrom: &str,
    genomic_pos: i64,
    code: u8,
    matrix: &SubstitutionMatrix,
) -> Option<char> {
    let reference = reference?;
    let bases = reference.bases(chrom, genomic_pos, genomic_pos)?;
    let ref_base = bases.chars().next()?;
    Some(matrix.lookup(ref_base, code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cram_flag_bits_match_spec() {
        assert_eq!(cram_flags::PRESERVE_QUAL_SCORES, 0x1);
        assert_eq!(cram_flags::DETACHED, 0x2);
        assert_eq!(cram_flags::HAS_MATE_DOWNSTREAM, 0x4);
        assert_eq!(cram_flags::NO_SEQ, 0x8);
    }
}
