//! Chunk-walking, filtering, and deduplication shared by streaming queries.

use std::collections::HashSet;
use std::io::{Read, Seek};

use gview_bai::Chunk;
use gview_bgzf::Reader as BgzfReader;
use gview_core::error::Result;
use gview_core::reader::Flow;
use gview_core::{AlignmentRecord, Flags};

use crate::record::{read_record, to_alignment_record};

/// Walks `chunks` in order, decoding full records, applying the filtering
/// policy from §4.3, and calling `consumer` for each accepted record.
///
/// Filtering policy: records with `UNMAPPED`, `SECONDARY`, or
/// `SUPPLEMENTARY` set are dropped; a record whose `ref_id` differs from
/// the query breaks out of the current chunk (chunks are ref-local); a
/// record starting at or past `end` also breaks; a record ending at or
/// before `start` is skipped without breaking.
pub fn query_streaming<R, F>(
    reader: &mut BgzfReader<R>,
    chunks: &[Chunk],
    ref_id: i32,
    start: i64,
    end: i64,
    mut consumer: F,
) -> Result<()>
where
    R: Read + Seek,
    F: FnMut(AlignmentRecord) -> Flow,
{
    let mut seen_offsets = HashSet::new();

    'chunks: for chunk in chunks {
        reader.seek(chunk.start())?;

        loop {
            let vo = reader.virtual_position();
            if vo >= chunk.end() {
                continue 'chunks;
            }

            let raw = match read_record(reader) {
                Ok(raw) => raw,
                Err(gview_core::Error::UnexpectedEof) => continue 'chunks,
                Err(e) => return Err(e),
            };

            if !seen_offsets.insert(vo.into_raw()) {
                continue;
            }

            if raw.flag.is_filtered_at_stream_time() {
                continue;
            }

            let Some(record_ref_id) = raw.ref_id else {
                continue;
            };

            if record_ref_id != ref_id {
                continue 'chunks;
            }

            if raw.pos >= end {
                continue 'chunks;
            }

            let record = to_alignment_record(raw);

            if record.end <= start {
                continue;
            }

            if consumer(record) == Flow::Stop {
                return Ok(());
            }
        }
    }

    Ok(())
}

/// A minimal per-record view used by [`crate::sampled_counts`], decoding
/// only what's needed to bin a read into coverage windows.
pub(crate) struct MinimalRecord {
    pub ref_id: Option<i32>,
    pub pos: i64,
    pub end: i64,
    pub flag: Flags,
}
