//! The top-level CRAM reader: opens a file plus its CRAI index and exposes
//! [`gview_core::AlignmentReader`].

use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use gview_core::cancel::CancellationToken;
use gview_core::error::{Error, Result};
use gview_core::reader::{bin_into_windows, AlignmentReader, ChunkProgress, Flow};
use gview_core::{AlignmentRecord, ReferenceSource, SequenceDictionary};

use crate::container;
use crate::file_definition;
use crate::header;
use crate::record::{decode_record, SliceDecodeState};

/// A CRAM reader over a local file, backed by its `.crai` index.
pub struct Reader {
    file: BufReader<File>,
    reference_sequences: SequenceDictionary,
    index: gview_crai::Index,
    sample_name: String,
    path: PathBuf,
    reference_source: Option<Box<dyn ReferenceSource>>,
}

impl Reader {
    /// Opens a CRAM file at `path`, locating its index at `<path>.crai`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file = BufReader::new(File::open(path).map_err(Error::Io)?);

        file_definition::read_file_definition(&mut file)?;
        let parsed_header = header::read_header(&mut file)?;

        let sample_name = header::sample_name_from_text(&parsed_header.text).unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "unknown".to_string())
        });

        let index = open_index(path)?;

        Ok(Self {
            file,
            reference_sequences: parsed_header.reference_sequences,
            index,
            sample_name,
            path: path.to_path_buf(),
            reference_source: None,
        })
    }

    /// Supplies a reference base source used to resolve `X` (substitution)
    /// read features. Without one, substitution features are still
    /// consumed to keep the bit-stream positioned correctly, but contribute
    /// no mismatch.
    pub fn set_reference_source(&mut self, source: impl ReferenceSource + 'static) {
        self.reference_source = Some(Box::new(source));
    }

    fn resolve_ref_id(&self, chrom: &str) -> Result<i32> {
        self.reference_sequences
            .resolve(chrom)
            .ok_or_else(|| Error::UnknownReference { name: chrom.to_string() })
    }
}

fn open_index(cram_path: &Path) -> Result<gview_crai::Index> {
    let mut candidate = cram_path.as_os_str().to_os_string();
    candidate.push(".crai");
    let with_suffix = PathBuf::from(candidate);

    let candidate_path = if with_suffix.is_file() {
        with_suffix
    } else {
        cram_path.with_extension("crai")
    };

    let file = File::open(&candidate_path).map_err(|_| Error::IndexMissing {
        path: candidate_path.to_string_lossy().into_owned(),
    })?;

    let records = gview_crai::read_index(BufReader::new(file))?;
    Ok(gview_crai::Index::new(records))
}

impl AlignmentReader for Reader {
    fn query_streaming<F>(&mut self, chrom: &str, start: i64, end: i64, mut consumer: F) -> Result<()>
    where
        F: FnMut(AlignmentRecord) -> Flow,
    {
        let ref_id = self.resolve_ref_id(chrom)?;
        let crai_records = self.index.query(ref_id, start, end);
        let offsets = gview_crai::Index::container_offsets(&crai_records);

        let reference_source = self.reference_source.as_deref();

        'containers: for offset in offsets {
            self.file.seek(SeekFrom::Start(offset)).map_err(Error::Io)?;
            let Some(container) = container::read_container(&mut self.file)? else {
                continue;
            };

            for mut slice in container.slices {
                if !slice.header.is_multi_reference() && slice.header.ref_seq_id != ref_id {
                    continue;
                }

                let mut state = SliceDecodeState::new(&slice);
                let num_records = slice.header.num_records;

                for _ in 0..num_records {
                    let record = decode_record(
                        &mut slice,
                        &container.compression_header,
                        &mut state,
                        chrom,
                        reference_source,
                    )?;

                    if record.flag.is_filtered_at_stream_time() {
                        continue;
                    }
                    if record.ref_id != Some(ref_id) {
                        continue;
                    }
                    if record.pos >= end {
                        continue;
                    }
                    if record.end <= start {
                        continue;
                    }

                    if consumer(record) == Flow::Stop {
                        break 'containers;
                    }
                }
            }
        }

        Ok(())
    }

    fn query_sampled_counts<P>(
        &mut self,
        chrom: &str,
        positions: &[i64],
        window: i64,
        counts: &mut [u32],
        cancel: &CancellationToken,
        mut progress: Option<P>,
    ) -> Result<()>
    where
        P: ChunkProgress,
    {
        let ref_id = self.resolve_ref_id(chrom)?;

        let query_start = positions.iter().copied().min().unwrap_or(0).max(0);
        let query_end = positions.iter().copied().map(|p| p + window).max().unwrap_or(0);

        let crai_records = self.index.query(ref_id, query_start, query_end);
        let offsets = gview_crai::Index::container_offsets(&crai_records);

        let reference_source = self.reference_source.as_deref();

        for offset in offsets {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            self.file.seek(SeekFrom::Start(offset)).map_err(Error::Io)?;
            let Some(container) = container::read_container(&mut self.file)? else {
                continue;
            };

            for mut slice in container.slices {
                if !slice.header.is_multi_reference() && slice.header.ref_seq_id != ref_id {
                    continue;
                }

                let mut state = SliceDecodeState::new(&slice);
                let num_records = slice.header.num_records;

                for _ in 0..num_records {
                    if cancel.is_cancelled() {
                        return Err(Error::Cancelled);
                    }

                    let record = decode_record(
                        &mut slice,
                        &container.compression_header,
                        &mut state,
                        chrom,
                        reference_source,
                    )?;

                    if record.flag.is_filtered_at_stream_time() {
                        continue;
                    }
                    if record.ref_id != Some(ref_id) {
                        continue;
                    }

                    bin_into_windows(record.pos, record.end, positions, window, counts);
                }
            }

            if let Some(p) = progress.as_mut() {
                p.on_chunk_done(counts);
            }
        }

        Ok(())
    }

    fn sample_name(&self) -> &str {
        &self.sample_name
    }

    fn ref_names(&self) -> Vec<&str> {
        self.reference_sequences.names().collect()
    }

    fn ref_lengths(&self) -> &[i32] {
        self.reference_sequences.lengths()
    }

    fn path(&self) -> &Path {
        &self.path
    }
}
