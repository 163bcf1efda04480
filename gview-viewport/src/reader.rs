//! An alignment reader that opens either a BAM or a CRAM file behind one
//! concrete type, so the per-file worker doesn't need to be generic over
//! the underlying decoder.

use std::path::{Path, PathBuf};

use gview_core::cancel::CancellationToken;
use gview_core::error::Result;
use gview_core::reader::{AlignmentReader, ChunkProgress, Flow};
use gview_core::AlignmentRecord;

/// Either decoder, behind one type the worker can own without generics.
pub enum OpenReader {
    /// A BGZF/BAI-backed BAM decoder.
    Bam(gview_bam::Reader),
    /// A CRAI-backed CRAM decoder.
    Cram(gview_cram::Reader),
}

impl OpenReader {
    /// Opens `path`, dispatching on its extension (`.cram` vs. anything
    /// else, which is treated as BAM).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let is_cram = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("cram"));

        if is_cram {
            Ok(Self::Cram(gview_cram::Reader::open(path)?))
        } else {
            Ok(Self::Bam(gview_bam::Reader::open(path)?))
        }
    }
}

impl AlignmentReader for OpenReader {
    fn query_streaming<F>(&mut self, chrom: &str, start: i64, end: i64, consumer: F) -> Result<()>
    where
        F: FnMut(AlignmentRecord) -> Flow,
    {
        match self {
            Self::Bam(reader) => reader.query_streaming(chrom, start, end, consumer),
            Self::Cram(reader) => reader.query_streaming(chrom, start, end, consumer),
        }
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
        match self {
            Self::Bam(reader) => reader.query_sampled_counts(chrom, positions, window, counts, cancel, progress),
            Self::Cram(reader) => reader.query_sampled_counts(chrom, positions, window, counts, cancel, progress),
        }
    }

    fn sample_name(&self) -> &str {
        match self {
            Self::Bam(reader) => reader.sample_name(),
            Self::Cram(reader) => reader.sample_name(),
        }
    }

    fn ref_names(&self) -> Vec<&str> {
        match self {
            Self::Bam(reader) => reader.ref_names(),
            Self::Cram(reader) => reader.ref_names(),
        }
    }

    fn ref_lengths(&self) -> &[i32] {
        match self {
            Self::Bam(reader) => reader.ref_lengths(),
            Self::Cram(reader) => reader.ref_lengths(),
        }
    }

    fn path(&self) -> &Path {
        match self {
            Self::Bam(reader) => reader.path(),
            Self::Cram(reader) => reader.path(),
        }
    }
}

impl OpenReader {
    /// The path this reader was opened from, owned.
    pub fn path_buf(&self) -> PathBuf {
        self.path().to_path_buf()
    }
}
