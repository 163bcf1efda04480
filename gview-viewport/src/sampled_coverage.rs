//! Sparse chromosome-wide coverage profile by window sampling (§4.9).

use crate::smoothing::box_blur;

/// Computes the sampling stride for a region split into `num_samples`
/// windows, floored at one base pair.
pub fn stride_for(start: i64, end: i64, num_samples: usize) -> i64 {
    let num_samples = num_samples.max(1) as i64;
    ((end - start) / num_samples).max(1)
}

/// Computes the per-window counting span from a stride, clamped to
/// `[100, 1000]` bp.
pub fn window_for_stride(stride: i64) -> i64 {
    (stride / 4).clamp(100, 1000)
}

/// A sampled coverage profile for one viewport, built progressively as
/// `query_sampled_counts` reports merged chunks.
#[derive(Clone, Debug)]
pub struct SampledCoverage {
    /// Reference sequence the profile covers.
    pub chrom: String,
    /// Inclusive region start requested.
    pub start: i64,
    /// Exclusive region end requested.
    pub end: i64,
    /// Distance in bp between sample positions.
    pub stride: i64,
    /// Per-sample counting window width, in bp.
    pub window: i64,
    /// Sample window starts, `start + i * stride`.
    pub positions: Vec<i64>,
    /// Raw read counts per sample, as last reported by the worker.
    pub counts: Vec<u32>,
    /// Depths derived from `counts`: `count * 1000 / window`.
    pub depths: Vec<f64>,
    /// Smoothed depths, present only once smoothing has run.
    pub smoothed: Option<Vec<f64>>,
    /// Max of the raw and (if present) smoothed depths.
    pub max_depth: f64,
    /// Monotonically non-decreasing count of samples with a contribution
    /// observed so far; forced to `positions.len()` on [`Self::finalize`].
    pub samples_completed: usize,
    /// Whether the job that produced this profile has finished.
    pub complete: bool,
}

impl SampledCoverage {
    /// Builds an empty, in-progress profile over `[start, end)`.
    pub fn new(chrom: String, start: i64, end: i64, num_samples: usize) -> Self {
        let stride = stride_for(start, end, num_samples);
        let window = window_for_stride(stride);
        let positions = (0..num_samples).map(|i| start + i as i64 * stride).collect();

        Self {
            chrom,
            start,
            end,
            stride,
            window,
            positions,
            counts: vec![0; num_samples],
            depths: vec![0.0; num_samples],
            smoothed: None,
            max_depth: 0.0,
            samples_completed: 0,
            complete: false,
        }
    }

    /// Whether this profile can serve a request for `[start, end)` at
    /// `new_stride` without recomputation: same chromosome, the cached
    /// region covers the request, and the new stride is no finer than a
    /// third of the cached one.
    pub fn is_valid_for(&self, chrom: &str, start: i64, end: i64, new_stride: i64) -> bool {
        self.chrom == chrom
            && self.start <= start
            && self.end >= end
            && (new_stride as f64) >= (self.stride as f64) / 3.0
    }

    /// Absorbs a chunk's cumulative counts, recomputing depths and the
    /// running max.
    pub fn on_chunk_done(&mut self, counts: &[u32]) {
        self.counts.copy_from_slice(counts);
        for (depth, &count) in self.depths.iter_mut().zip(counts) {
            *depth = f64::from(count) * 1000.0 / self.window as f64;
        }
        self.max_depth = self.depths.iter().copied().fold(self.max_depth, f64::max);

        let touched = counts.iter().filter(|&&c| c > 0).count();
        self.samples_completed = self.samples_completed.max(touched);
    }

    /// Marks the job complete, optionally smoothing with a 3-pass moving
    /// average of radius `clamp(1, numSamples/30, 6)`.
    pub fn finalize(&mut self, smoothing_enabled: bool) {
        if smoothing_enabled && !self.positions.is_empty() {
            let radius = ((self.positions.len() as i64) / 30).clamp(1, 6) as usize;
            let smoothed = box_blur(&self.depths, radius, 3);
            let smoothed_max = smoothed.iter().copied().fold(0.0, f64::max);
            self.max_depth = self.max_depth.max(smoothed_max);
            self.smoothed = Some(smoothed);
        } else {
            self.smoothed = None;
        }

        self.samples_completed = self.positions.len();
        self.complete = true;
    }

    /// The profile consumers should render: smoothed if available, else
    /// raw depths.
    pub fn display_profile(&self) -> &[f64] {
        self.smoothed.as_deref().unwrap_or(&self.depths)
    }

    /// The display profile with peaks restored where smoothing flattened a
    /// raw spike: `max(smoothed[i], 0.1 * depths[i])`.
    pub fn restore_peaks(&self) -> Vec<f64> {
        match &self.smoothed {
            Some(smoothed) => smoothed
                .iter()
                .zip(&self.depths)
                .map(|(&s, &d)| s.max(0.1 * d))
                .collect(),
            None => self.depths.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_s6_sampled_counts_scenario() {
        use gview_core::reader::bin_into_windows;

        let positions = [0, 1000, 2000];
        let window = 200;
        let mut counts = [0u32; 3];
        bin_into_windows(50, 250, &positions, window, &mut counts);
        bin_into_windows(1800, 2100, &positions, window, &mut counts);
        assert_eq!(counts, [1, 0, 1]);
    }

    #[test]
    fn test_stride_and_window_clamping() {
        assert_eq!(stride_for(0, 3_000_000, 300), 10_000);
        assert_eq!(window_for_stride(10_000), 1000);
        assert_eq!(window_for_stride(40), 100);
    }

    #[test]
    fn test_property_10_samples_completed_monotone_and_final() {
        let mut profile = SampledCoverage::new("chr1".to_string(), 0, 1_000_000, 10);
        profile.on_chunk_done(&[1, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        let first = profile.samples_completed;
        profile.on_chunk_done(&[1, 0, 0, 0, 2, 0, 0, 0, 0, 0]);
        assert!(profile.samples_completed >= first);

        profile.finalize(false);
        assert!(profile.complete);
        assert_eq!(profile.samples_completed, profile.positions.len());
    }

    #[test]
    fn test_is_valid_for_requires_covering_region_and_comparable_stride() {
        let profile = SampledCoverage::new("chr1".to_string(), 0, 900_000, 90);
        assert_eq!(profile.stride, 10_000);
        assert!(profile.is_valid_for("chr1", 100_000, 800_000, 10_000));
        assert!(!profile.is_valid_for("chr2", 100_000, 800_000, 10_000));
        assert!(!profile.is_valid_for("chr1", 0, 1_000_000, 10_000));
        assert!(!profile.is_valid_for("chr1", 100_000, 800_000, 2_000));
    }
}
