//! Viewport identity, navigation state, the per-viewport read cache, and
//! the cache-policy decision table (§4.7, rules 1-5).

use gview_core::AlignmentRecord;

/// Opaque handle identifying a viewport; owned and allocated by the
/// caller (a GUI canvas, in the system this backend serves).
pub type ViewportId = u64;

/// Default ceiling on `view_length` before the read cache gives way to
/// sampled coverage.
pub const MAX_BAM_VIEW_LENGTH_DEFAULT: i64 = 500_000;

/// The three transient UI states that suppress new fetches while
/// `block_during_navigation` is set.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct NavigationState {
    /// The viewport is panning.
    pub navigating: bool,
    /// The user is dragging the cytoband overview.
    pub cytoband_dragging: bool,
    /// A zoom animation is in flight.
    pub zoom_animating: bool,
}

impl NavigationState {
    /// Whether any transient state that should suppress new fetches is
    /// active.
    pub fn is_busy(&self) -> bool {
        self.navigating || self.cytoband_dragging || self.zoom_animating
    }
}

/// A viewport's cached read stack: the region it covers, the scale it was
/// packed at, and whether it was fetched in coverage-only mode.
#[derive(Clone, Debug)]
pub struct StackCache {
    /// Reference sequence the cache covers.
    pub chrom: String,
    /// Cached region start.
    pub start: i64,
    /// Cached region end.
    pub end: i64,
    /// `view_length / canvas_width` the cache was last packed at.
    pub scale: f64,
    /// Whether this cache was fetched with row packing skipped.
    pub coverage_only: bool,
    /// Cached records, in the order they were packed.
    pub records: Vec<AlignmentRecord>,
    /// Highest row index assigned, or `-1` if empty.
    pub max_row: i32,
    /// Monotonic version, bumped on every commit; used by
    /// [`crate::coverage_cache::CoverageBins`] invalidation instead of
    /// object identity.
    pub version: u64,
}

impl StackCache {
    /// An empty cache covering no region.
    pub fn empty() -> Self {
        Self {
            chrom: String::new(),
            start: 0,
            end: 0,
            scale: 1.0,
            coverage_only: false,
            records: Vec::new(),
            max_row: -1,
            version: 0,
        }
    }

    /// Whether `[start, end)` on `chrom` is fully covered by this cache.
    pub fn contains(&self, chrom: &str, start: i64, end: i64) -> bool {
        self.chrom == chrom && start >= self.start && end <= self.end
    }

    /// Whether `[start, end)` on `chrom` shares no overlap with this
    /// cache's region (or is on a different chromosome entirely).
    pub fn is_disjoint_from(&self, chrom: &str, start: i64, end: i64) -> bool {
        self.chrom != chrom || end <= self.start || start >= self.end
    }
}

/// What the cache policy decided to do for a `get_reads` call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Decision {
    /// `view_length` exceeds the configured ceiling: clear the cache and
    /// report nothing (sampled coverage takes over at this zoom).
    ClearAndSampleOnly,
    /// Chromosome changed, the cache is disjoint, or the mode toggled:
    /// clear and fetch the inflated region fresh.
    ClearAndFetch {
        /// Inflated fetch region start.
        fetch_start: i64,
        /// Inflated fetch region end.
        fetch_end: i64,
    },
    /// The requested region is already fully cached at a comparable
    /// scale; serve the snapshot as-is.
    CacheHit,
    /// The requested region is cached, but `scale` has moved by more than
    /// 2x since the cache was packed; repack in place at the new scale.
    RepackInPlace {
        /// The scale to repack at.
        new_scale: f64,
    },
    /// The requested region is not (fully) cached: submit a fetch for the
    /// inflated region without clearing what's already cached.
    Fetch {
        /// Inflated fetch region start.
        fetch_start: i64,
        /// Inflated fetch region end.
        fetch_end: i64,
    },
}

/// Minimum bp to inflate a fetch region by, on either side.
const MIN_INFLATE_BP: i64 = 1_000;

/// Fraction of the view length to additionally inflate by.
const INFLATE_FRACTION: f64 = 0.3;

/// Evaluates the §4.7 cache policy for a `get_reads(chrom, start, end, ...)`
/// call against the viewport's current `cache`.
pub fn decide(
    cache: &StackCache,
    chrom: &str,
    start: i64,
    end: i64,
    coverage_only: bool,
    scale: f64,
    max_view_length: i64,
) -> Decision {
    let view_length = (end - start).max(1);

    if view_length > max_view_length {
        return Decision::ClearAndSampleOnly;
    }

    if cache.is_disjoint_from(chrom, start, end) {
        let (fetch_start, fetch_end) = inflate(start, end, view_length);
        return Decision::ClearAndFetch { fetch_start, fetch_end };
    }

    if cache.coverage_only != coverage_only {
        let (fetch_start, fetch_end) = inflate(start, end, view_length);
        return Decision::ClearAndFetch { fetch_start, fetch_end };
    }

    if cache.contains(chrom, start, end) {
        if !coverage_only && !cache.records.is_empty() {
            let ratio = scale / cache.scale.max(f64::EPSILON);
            if ratio >= 2.0 || ratio <= 0.5 {
                return Decision::RepackInPlace { new_scale: scale };
            }
        }
        return Decision::CacheHit;
    }

    let (fetch_start, fetch_end) = inflate(start, end, view_length);
    Decision::Fetch { fetch_start, fetch_end }
}

fn inflate(start: i64, end: i64, view_length: i64) -> (i64, i64) {
    let margin = (INFLATE_FRACTION * view_length as f64).max(MIN_INFLATE_BP as f64) as i64;
    ((start - margin).max(1), end + margin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_length_over_ceiling_clears_and_samples() {
        let cache = StackCache::empty();
        let decision = decide(&cache, "chr1", 0, 1_000_000, false, 1.0, MAX_BAM_VIEW_LENGTH_DEFAULT);
        assert_eq!(decision, Decision::ClearAndSampleOnly);
    }

    #[test]
    fn test_chromosome_change_clears_and_fetches() {
        let mut cache = StackCache::empty();
        cache.chrom = "chr2".to_string();
        cache.start = 0;
        cache.end = 5000;
        let decision = decide(&cache, "chr1", 1000, 2000, false, 1.0, MAX_BAM_VIEW_LENGTH_DEFAULT);
        assert!(matches!(decision, Decision::ClearAndFetch { .. }));
    }

    #[test]
    fn test_mode_toggle_clears_per_s7() {
        let mut cache = StackCache::empty();
        cache.chrom = "chr1".to_string();
        cache.start = 700;
        cache.end = 2300;
        cache.coverage_only = false;
        cache.records = vec![]; // 500 reads in the original scenario; emptiness doesn't matter here

        let decision = decide(&cache, "chr1", 1500, 1800, true, 1.0, MAX_BAM_VIEW_LENGTH_DEFAULT);
        assert!(matches!(decision, Decision::ClearAndFetch { .. }));
    }

    #[test]
    fn test_cache_hit_when_fully_covered_at_stable_scale() {
        let mut cache = StackCache::empty();
        cache.chrom = "chr1".to_string();
        cache.start = 0;
        cache.end = 10_000;
        cache.scale = 1.0;
        let decision = decide(&cache, "chr1", 1000, 2000, false, 1.2, MAX_BAM_VIEW_LENGTH_DEFAULT);
        assert_eq!(decision, Decision::CacheHit);
    }

    #[test]
    fn test_repack_triggered_past_2x_scale_change() {
        let mut cache = StackCache::empty();
        cache.chrom = "chr1".to_string();
        cache.start = 0;
        cache.end = 10_000;
        cache.scale = 1.0;
        cache.records.push(gview_core::AlignmentRecord {
            ref_id: Some(0),
            pos: 10,
            end: 20,
            flag: gview_core::Flags::empty(),
            mapq: 0,
            read_length: 10,
            cigar_ops: Vec::new(),
            read_name: String::new(),
            mismatches: None,
            seq: None,
            row: -1,
        });

        let decision = decide(&cache, "chr1", 1000, 2000, false, 2.5, MAX_BAM_VIEW_LENGTH_DEFAULT);
        assert_eq!(decision, Decision::RepackInPlace { new_scale: 2.5 });
    }

    #[test]
    fn test_fetch_inflates_by_30_percent_or_1000bp_minimum() {
        let mut cache = StackCache::empty();
        cache.chrom = "chr1".to_string();
        cache.start = 0;
        cache.end = 500;
        let decision = decide(&cache, "chr1", 100, 600, false, 1.0, MAX_BAM_VIEW_LENGTH_DEFAULT);
        match decision {
            Decision::Fetch { fetch_start, fetch_end } => {
                assert_eq!(fetch_start, 1); // max(1, 100 - 1000)
                assert_eq!(fetch_end, 1600); // 600 + 1000
            }
            other => panic!("expected Fetch, got {other:?}"),
        }
    }
}
