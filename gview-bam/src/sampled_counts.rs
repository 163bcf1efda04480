//! Minimal-decode sampled coverage counting (§4.6).

use std::collections::HashSet;
use std::io::{Read, Seek};

use gview_bai::Chunk;
use gview_bgzf::Reader as BgzfReader;
use gview_core::cancel::CancellationToken;
use gview_core::error::{Error, Result};
use gview_core::reader::{bin_into_windows, ChunkProgress};
use gview_core::Flags;

use crate::query::MinimalRecord;

/// Reads only `(ref_id, pos, flag, read_length)` from the next record and
/// skips the remainder, used for fast window counting.
fn read_minimal<R: Read + Seek>(reader: &mut BgzfReader<R>) -> Result<MinimalRecord> {
    let block_size = reader.read_i32()? as usize;
    let ref_id_raw = reader.read_i32()?;
    let pos0 = reader.read_i32()?;
    let _bin_mq_nl = reader.read_u32()?;
    let flag_nc = reader.read_u32()?;
    let read_length = reader.read_i32()?;

    let consumed_after_block_size = 20; // refID, pos, bin_mq_nl, flag_nc, l_seq
    let remaining = block_size.checked_sub(consumed_after_block_size).ok_or(Error::DecompressionFailure {
        reason: "block_size smaller than fixed fields".into(),
    })?;
    reader.skip(remaining)?;

    let flag = Flags::from_bits_truncate((flag_nc >> 16) as u16);
    let pos = i64::from(pos0) + 1;
    let cigar_span_unknown = i64::from(read_length.max(0)).max(1);
    let end = pos + cigar_span_unknown;

    let ref_id = if ref_id_raw < 0 { None } else { Some(ref_id_raw) };

    Ok(MinimalRecord { ref_id, pos, end, flag })
}

/// Counts reads overlapping each sampling window, merging BAI chunks across
/// all windows, decoding minimally, and notifying `progress` after each
/// merged chunk.
pub fn query_sampled_counts<R, P>(
    reader: &mut BgzfReader<R>,
    chunks: &[Chunk],
    ref_id: i32,
    positions: &[i64],
    window: i64,
    counts: &mut [u32],
    cancel: &CancellationToken,
    mut progress: Option<P>,
) -> Result<()>
where
    R: Read + Seek,
    P: ChunkProgress,
{
    let mut seen_offsets = HashSet::new();

    'chunks: for chunk in chunks {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        reader.seek(chunk.start())?;

        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let vo = reader.virtual_position();
            if vo >= chunk.end() {
                break;
            }

            let record = match read_minimal(reader) {
                Ok(r) => r,
                Err(Error::UnexpectedEof) => break,
                Err(e) => return Err(e),
            };

            if !seen_offsets.insert(vo.into_raw()) {
                continue;
            }

            if record.flag.is_filtered_at_stream_time() {
                continue;
            }

            let Some(record_ref_id) = record.ref_id else {
                continue;
            };

            if record_ref_id != ref_id {
                continue 'chunks;
            }

            bin_into_windows(record.pos, record.end, positions, window, counts);
        }

        if let Some(p) = progress.as_mut() {
            p.on_chunk_done(counts);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bin_into_windows_reexported() {
        let positions = [0, 1000];
        let mut counts = [0u32; 2];
        bin_into_windows(50, 250, &positions, 200, &mut counts);
        assert_eq!(counts, [1, 0]);
    }
}
