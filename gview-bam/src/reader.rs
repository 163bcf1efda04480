//! The top-level BAM reader: opens a file plus its BAI index and exposes
//! [`gview_core::AlignmentReader`].

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use gview_bai::Index as BaiIndex;
use gview_bgzf::Reader as BgzfReader;
use gview_core::cancel::CancellationToken;
use gview_core::error::{Error, Result};
use gview_core::reader::{AlignmentReader, ChunkProgress, Flow};
use gview_core::{AlignmentRecord, SequenceDictionary};

use crate::header::{self, Header};
use crate::{query, sampled_counts};

/// A BAM reader over a local file, backed by its `.bai` index.
pub struct Reader {
    bgzf: BgzfReader<BufReader<File>>,
    reference_sequences: SequenceDictionary,
    index: BaiIndex,
    sample_name: String,
    path: PathBuf,
}

impl Reader {
    /// Opens a BAM file at `path`, locating its index at `<path>.bai` or
    /// `<path without .bam>.bai`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(Error::Io)?;
        let mut bgzf = BgzfReader::new(BufReader::new(file));

        let Header {
            text,
            reference_sequences,
        } = header::read_header(&mut bgzf)?;

        let sample_name = header::sample_name_from_text(&text).unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "unknown".to_string())
        });

        let index = open_index(path)?;

        Ok(Self {
            bgzf,
            reference_sequences,
            index,
            sample_name,
            path: path.to_path_buf(),
        })
    }

    fn resolve_ref_id(&self, chrom: &str) -> Result<i32> {
        self.reference_sequences
            .resolve(chrom)
            .ok_or_else(|| Error::UnknownReference { name: chrom.to_string() })
    }
}

fn open_index(bam_path: &Path) -> Result<BaiIndex> {
    let mut candidate = bam_path.as_os_str().to_os_string();
    candidate.push(".bai");
    let with_suffix = PathBuf::from(candidate);

    let candidate_path = if with_suffix.is_file() {
        with_suffix
    } else {
        bam_path.with_extension("bai")
    };

    let file = File::open(&candidate_path).map_err(|_| Error::IndexMissing {
        path: candidate_path.to_string_lossy().into_owned(),
    })?;

    gview_bai::read_index(&mut BufReader::new(file))
}

impl AlignmentReader for Reader {
    fn query_streaming<F>(&mut self, chrom: &str, start: i64, end: i64, consumer: F) -> Result<()>
    where
        F: FnMut(AlignmentRecord) -> Flow,
    {
        let ref_id = self.resolve_ref_id(chrom)?;
        let chunks = self.index.chunks(ref_id, start.max(0), end.max(0));
        query::query_streaming(&mut self.bgzf, &chunks, ref_id, start, end, consumer)
    }

    fn query_sampled_counts<P>(
        &mut self,
        chrom: &str,
        positions: &[i64],
        window: i64,
        counts: &mut [u32],
        cancel: &CancellationToken,
        progress: Option<P>,
    ) -> Result<()>
    where
        P: ChunkProgress,
    {
        let ref_id = self.resolve_ref_id(chrom)?;

        let query_start = positions.iter().copied().min().unwrap_or(0).max(0);
        let query_end = positions.iter().copied().map(|p| p + window).max().unwrap_or(0);
        let chunks = self.index.chunks(ref_id, query_start, query_end);

        sampled_counts::query_sampled_counts(
            &mut self.bgzf,
            &chunks,
            ref_id,
            positions,
            window,
            counts,
            cancel,
            progress,
        )
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
