//! The common alignment-reading capability implemented by the BAM and CRAM
//! decoders.

use std::path::Path;

use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::record::AlignmentRecord;

/// Return value of a [`AlignmentReader::query_streaming`] consumer callback:
/// whether to keep pulling records or stop immediately.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Flow {
    /// Keep streaming records.
    Continue,
    /// Stop immediately; no further records will be produced.
    Stop,
}

/// Notification fired after each merged chunk/container is processed during
/// a sampled-counts query, so a caller can publish partial progress.
pub trait ChunkProgress {
    /// Called with the current (partial) counts after each chunk/container.
    fn on_chunk_done(&mut self, counts: &[u32]);
}

impl<F> ChunkProgress for F
where
    F: FnMut(&[u32]),
{
    fn on_chunk_done(&mut self, counts: &[u32]) {
        self(counts)
    }
}

/// Common capability shared by the BAM and CRAM decoders: streaming query,
/// full query, and sampled coverage counts.
///
/// Ordering guarantee: within a single call, records are produced in
/// non-decreasing virtual-offset (BAM) or container-order (CRAM) sequence,
/// not necessarily non-decreasing `pos` order across chunks.
pub trait AlignmentReader {
    /// Collects all records overlapping `[start, end)` on `chrom` into a
    /// `Vec`, applying the same filtering policy as [`Self::query_streaming`].
    fn query(&mut self, chrom: &str, start: i64, end: i64) -> Result<Vec<AlignmentRecord>> {
        let mut out = Vec::new();
        self.query_streaming(chrom, start, end, |record| {
            out.push(record);
            Flow::Continue
        })?;
        Ok(out)
    }

    /// Streams records overlapping `[start, end)` on `chrom` to `consumer`,
    /// in order of underlying file position, stopping immediately if the
    /// consumer returns [`Flow::Stop`].
    fn query_streaming<F>(&mut self, chrom: &str, start: i64, end: i64, consumer: F) -> Result<()>
    where
        F: FnMut(AlignmentRecord) -> Flow;

    /// Streams records overlapping `[start, end)`, same as
    /// [`Self::query_streaming`], but observes `cancel` between records and
    /// returns [`crate::error::Error::Cancelled`] if it becomes set.
    fn query_streaming_cancellable<F>(
        &mut self,
        chrom: &str,
        start: i64,
        end: i64,
        cancel: &CancellationToken,
        mut consumer: F,
    ) -> Result<()>
    where
        F: FnMut(AlignmentRecord) -> Flow,
    {
        let mut cancelled = false;

        self.query_streaming(chrom, start, end, |record| {
            if cancel.is_cancelled() {
                cancelled = true;
                return Flow::Stop;
            }
            consumer(record)
        })?;

        if cancelled {
            return Err(crate::error::Error::Cancelled);
        }

        Ok(())
    }

    /// Counts reads overlapping each window `[positions[i], positions[i] +
    /// window)` into `counts[i]`, notifying `progress` after each merged
    /// chunk/container is processed.
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
        P: ChunkProgress;

    /// The sample name, resolved from `@RG SM:` or the filename.
    fn sample_name(&self) -> &str;

    /// Reference sequence names, in dictionary order.
    fn ref_names(&self) -> Vec<&str>;

    /// Reference sequence lengths, in dictionary order.
    fn ref_lengths(&self) -> &[i32];

    /// The path this reader was opened from.
    fn path(&self) -> &Path;
}

/// Bins a single record's overlap into every window it intersects.
///
/// Shared by the BAM and CRAM `query_sampled_counts` implementations: a
/// record contributes to `counts[i]` whenever `[record.pos, record.end)`
/// overlaps `[positions[i], positions[i] + window)`.
pub fn bin_into_windows(
    record_start: i64,
    record_end: i64,
    positions: &[i64],
    window: i64,
    counts: &mut [u32],
) {
    for (i, &p) in positions.iter().enumerate() {
        let window_end = p + window;
        if record_start < window_end && p < record_end {
            counts[i] += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bin_into_windows_s6() {
        // S6: positions = [0, 1000, 2000], window = 200.
        let positions = [0, 1000, 2000];
        let window = 200;
        let mut counts = [0u32; 3];

        bin_into_windows(50, 250, &positions, window, &mut counts);
        bin_into_windows(1800, 2100, &positions, window, &mut counts);

        assert_eq!(counts, [1, 0, 1]);
    }
}
