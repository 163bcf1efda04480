//! Bin-level cache of computed coverage and per-base mismatch stacks for a
//! viewport (§4.10), invalidated on zoom-scale change or a new read set.

use gview_core::AlignmentRecord;

use crate::smoothing::box_blur;

/// Computed, bin-indexed coverage plus allelic letter stacks for one
/// viewport.
#[derive(Clone, Debug)]
pub struct CoverageBins {
    /// Bin width, in bp.
    pub bin_size: f64,
    /// Inflated region start this cache covers.
    pub start: i64,
    /// Inflated region end this cache covers.
    pub end: i64,
    /// Raw per-bin read depth.
    pub bin_cov: Vec<u32>,
    /// Per-bin mismatch-to-`A` counts.
    pub mm_a: Vec<u32>,
    /// Per-bin mismatch-to-`C` counts.
    pub mm_c: Vec<u32>,
    /// Per-bin mismatch-to-`G` counts.
    pub mm_g: Vec<u32>,
    /// Per-bin mismatch-to-`T` counts.
    pub mm_t: Vec<u32>,
    /// Smoothed `bin_cov`, used for the fill; raw counters remain
    /// available for the allelic-fraction bars.
    pub smoothed: Vec<f64>,
    /// Max of raw and smoothed coverage, for axis scaling.
    pub scale_max: f64,
    /// Monotonic version of the read set this cache was built from, used
    /// to invalidate on a new fetch without relying on object identity.
    pub source_version: u64,
}

impl CoverageBins {
    /// Builds bins over `[start, end)` inflated by half the view length,
    /// at `canvas_width` resolution, from `records`.
    pub fn build(
        start: i64,
        end: i64,
        canvas_width: usize,
        records: &[AlignmentRecord],
        source_version: u64,
        smoothing_enabled: bool,
    ) -> Self {
        let view_length = (end - start).max(1);
        let buffer = view_length / 2;
        let infl_start = (start - buffer).max(1);
        let infl_end = end + buffer;

        let num_bins = canvas_width.max(1);
        let bin_size = (infl_end - infl_start).max(1) as f64 / num_bins as f64;

        let mut bin_cov = vec![0u32; num_bins];
        let mut mm_a = vec![0u32; num_bins];
        let mut mm_c = vec![0u32; num_bins];
        let mut mm_g = vec![0u32; num_bins];
        let mut mm_t = vec![0u32; num_bins];

        let bin_of = |pos: i64| -> Option<usize> {
            if pos < infl_start || pos >= infl_end {
                return None;
            }
            let idx = ((pos - infl_start) as f64 / bin_size) as usize;
            Some(idx.min(num_bins - 1))
        };

        for record in records {
            let record_start = record.pos.max(infl_start);
            let record_end = record.end.min(infl_end);
            if record_start >= record_end {
                continue;
            }
            if let (Some(b0), Some(b1)) = (bin_of(record_start), bin_of(record_end - 1)) {
                for bin in &mut bin_cov[b0..=b1] {
                    *bin += 1;
                }
            }

            if let Some(mismatches) = &record.mismatches {
                for mismatch in mismatches {
                    let Some(bin) = bin_of(mismatch.genomic_pos) else {
                        continue;
                    };
                    match mismatch.base {
                        'A' => mm_a[bin] += 1,
                        'C' => mm_c[bin] += 1,
                        'G' => mm_g[bin] += 1,
                        'T' => mm_t[bin] += 1,
                        _ => {}
                    }
                }
            }
        }

        let radius = ((num_bins as i64) / 80).clamp(1, 8) as usize;
        let raw: Vec<f64> = bin_cov.iter().map(|&c| f64::from(c)).collect();
        let smoothed = if smoothing_enabled { box_blur(&raw, radius, 3) } else { raw.clone() };

        let raw_max = bin_cov.iter().copied().max().unwrap_or(0) as f64;
        let smoothed_max = smoothed.iter().copied().fold(0.0, f64::max);

        Self {
            bin_size,
            start: infl_start,
            end: infl_end,
            bin_cov,
            mm_a,
            mm_c,
            mm_g,
            mm_t,
            smoothed,
            scale_max: raw_max.max(smoothed_max),
            source_version,
        }
    }

    /// Whether this cache must be rebuilt for `[start, end)` at
    /// `canvas_width` over read set `source_version`: bin size drifted by
    /// more than 1%, the requested region isn't covered, or the read set
    /// changed.
    pub fn is_stale(&self, start: i64, end: i64, canvas_width: usize, source_version: u64) -> bool {
        if source_version != self.source_version {
            return true;
        }
        if start < self.start || end > self.end {
            return true;
        }
        let new_bin_size = (end - start).max(1) as f64 / canvas_width.max(1) as f64;
        let drift = (new_bin_size - self.bin_size).abs() / self.bin_size.max(f64::EPSILON);
        drift > 0.01
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gview_core::{Flags, Mismatch};

    fn record(pos: i64, end: i64) -> AlignmentRecord {
        AlignmentRecord {
            ref_id: Some(0),
            pos,
            end,
            flag: Flags::empty(),
            mapq: 60,
            read_length: (end - pos) as i32,
            cigar_ops: Vec::new(),
            read_name: "r".to_string(),
            mismatches: Some(vec![Mismatch::new(pos + 1, 'G')]),
            seq: None,
            row: -1,
        }
    }

    #[test]
    fn test_build_counts_overlapping_bins() {
        let records = vec![record(1000, 1100), record(1050, 1200)];
        let bins = CoverageBins::build(1000, 1200, 20, &records, 1, false);
        assert!(bins.bin_cov.iter().any(|&c| c >= 2));
        assert!(bins.mm_g.iter().sum::<u32>() >= 2);
    }

    #[test]
    fn test_is_stale_on_version_change() {
        let records = vec![record(1000, 1100)];
        let bins = CoverageBins::build(1000, 1200, 20, &records, 1, false);
        assert!(bins.is_stale(1000, 1200, 20, 2));
        assert!(!bins.is_stale(1000, 1200, 20, 1));
    }

    #[test]
    fn test_is_stale_on_region_outside_cache() {
        let records = vec![record(1000, 1100)];
        let bins = CoverageBins::build(1000, 1200, 20, &records, 1, false);
        assert!(bins.is_stale(bins.start - 10, bins.end, 20, 1));
    }
}
