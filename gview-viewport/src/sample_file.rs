//! The public facade over one opened alignment file: `SampleFile`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use gview_core::cancel::CancellationToken;
use gview_core::error::Result;
use gview_core::AlignmentRecord;
use tokio::sync::{mpsc, watch};

use crate::reader::OpenReader;
use crate::sampled_coverage::{stride_for, SampledCoverage};
use crate::viewport::{self, Decision, NavigationState, StackCache, ViewportId, MAX_BAM_VIEW_LENGTH_DEFAULT};
use crate::worker::{self, SharedState, WorkItem};

/// Tunables the facade was built with; all default to the spec's stated
/// values.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Ceiling on `view_length` before reads give way to sampled coverage.
    pub max_bam_view_length: i64,
    /// Whether sampled-coverage and coverage-cache smoothing is enabled.
    pub smoothing_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_bam_view_length: MAX_BAM_VIEW_LENGTH_DEFAULT,
            smoothing_enabled: true,
        }
    }
}

/// A pending fetch region, used to coalesce duplicate submissions for the
/// same `(chrom, fetch_start, fetch_end)`.
#[derive(Clone, Debug, Eq, PartialEq)]
struct InFlightRegion {
    chrom: String,
    start: i64,
    end: i64,
}

/// One opened alignment file (BAM or CRAM), with a per-viewport read
/// cache, sampled-coverage engine, and async fetch scheduling.
pub struct SampleFile {
    tx: mpsc::UnboundedSender<WorkItem>,
    shared: Arc<SharedState>,
    in_flight: RwLock<HashMap<ViewportId, InFlightRegion>>,
    cancel_tokens: RwLock<HashMap<ViewportId, CancellationToken>>,
    nav_state: RwLock<NavigationState>,
    config: Config,
    _worker: tokio::task::JoinHandle<()>,
}

impl SampleFile {
    /// Opens `path` and starts its per-file worker task.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_config(path, Config::default())
    }

    /// Opens `path` with explicit tunables.
    pub fn open_with_config<P: AsRef<Path>>(path: P, config: Config) -> Result<Self> {
        let reader = OpenReader::open(path)?;
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(SharedState::new());

        let worker_shared = Arc::clone(&shared);
        let handle = tokio::task::spawn(worker::run(reader, rx, worker_shared));

        Ok(Self {
            tx,
            shared,
            in_flight: RwLock::new(HashMap::new()),
            cancel_tokens: RwLock::new(HashMap::new()),
            nav_state: RwLock::new(NavigationState::default()),
            config,
            _worker: handle,
        })
    }

    /// Updates the shared navigation state observed by every viewport on
    /// this file.
    pub fn set_navigation_state(&self, state: NavigationState) {
        *self.nav_state.write().unwrap() = state;
    }

    /// A channel that ticks every time a viewport's cache or coverage
    /// profile on this file is updated.
    pub fn subscribe_redraw(&self) -> watch::Receiver<u64> {
        self.shared.redraw.subscribe()
    }

    /// Returns cached (possibly stale) reads for `viewport` immediately,
    /// scheduling a fetch if the cache policy calls for one.
    pub fn get_reads(
        &self,
        chrom: &str,
        start: i64,
        end: i64,
        viewport: ViewportId,
        canvas_width: usize,
        block_during_navigation: bool,
        coverage_only: bool,
    ) -> Vec<AlignmentRecord> {
        let scale = (end - start).max(1) as f64 / canvas_width.max(1) as f64;

        let mut caches = self.shared.stack_caches.write().unwrap();
        let cache = caches.entry(viewport).or_insert_with(|| Arc::new(StackCache::empty()));

        let decision = viewport::decide(cache, chrom, start, end, coverage_only, scale, self.config.max_bam_view_length);

        match decision {
            Decision::ClearAndSampleOnly => {
                *cache = Arc::new(StackCache::empty());
                Vec::new()
            }
            Decision::ClearAndFetch { fetch_start, fetch_end } => {
                *cache = Arc::new(StackCache {
                    chrom: chrom.to_string(),
                    ..StackCache::empty()
                });
                let snapshot = Arc::clone(cache);
                drop(caches);
                self.maybe_submit_fetch(viewport, chrom, fetch_start, fetch_end, coverage_only, scale, block_during_navigation);
                snapshot.records.clone()
            }
            Decision::CacheHit => cache.records.clone(),
            Decision::RepackInPlace { new_scale } => {
                let mut records = cache.records.clone();
                let max_row = crate::row_packing::repack(&mut records, new_scale);
                let repacked = StackCache {
                    chrom: cache.chrom.clone(),
                    start: cache.start,
                    end: cache.end,
                    scale: new_scale,
                    coverage_only: cache.coverage_only,
                    records: records.clone(),
                    max_row,
                    version: cache.version,
                };
                *cache = Arc::new(repacked);
                records
            }
            Decision::Fetch { fetch_start, fetch_end } => {
                let snapshot = Arc::clone(cache);
                drop(caches);
                self.maybe_submit_fetch(viewport, chrom, fetch_start, fetch_end, coverage_only, scale, block_during_navigation);
                snapshot.records.clone()
            }
        }
    }

    /// Whether a fetch or sampled-coverage job is in flight for `viewport`.
    pub fn is_loading(&self, viewport: ViewportId) -> bool {
        self.shared.loading.read().unwrap().contains(&viewport)
    }

    /// The highest packed row index for `viewport`, or `-1` if empty.
    pub fn max_row(&self, viewport: ViewportId) -> i32 {
        self.shared
            .stack_caches
            .read()
            .unwrap()
            .get(&viewport)
            .map(|c| c.max_row)
            .unwrap_or(-1)
    }

    /// Returns the current (possibly in-progress) sampled-coverage profile
    /// for `viewport`, recomputing it if the cached one doesn't cover this
    /// request at a comparable stride.
    pub fn request_sampled_coverage(
        &self,
        chrom: &str,
        start: i64,
        end: i64,
        num_samples: usize,
        viewport: ViewportId,
    ) -> Arc<SampledCoverage> {
        let new_stride = stride_for(start, end, num_samples);

        let existing = self.shared.sampled_coverage.read().unwrap().get(&viewport).cloned();
        if let Some(profile) = &existing {
            if profile.is_valid_for(chrom, start, end, new_stride) {
                return Arc::clone(profile);
            }
        }

        let mut tokens = self.cancel_tokens.write().unwrap();
        if let Some(token) = tokens.remove(&viewport) {
            token.cancel();
        }
        let cancel = CancellationToken::new();
        tokens.insert(viewport, cancel.clone());
        drop(tokens);

        self.shared.loading.write().unwrap().insert(viewport);

        let _ = self.tx.send(WorkItem::SampledCoverage {
            viewport,
            chrom: chrom.to_string(),
            start,
            end,
            num_samples,
            smoothing_enabled: self.config.smoothing_enabled,
            cancel,
        });

        existing.unwrap_or_else(|| Arc::new(SampledCoverage::new(chrom.to_string(), start, end, num_samples)))
    }

    #[allow(clippy::too_many_arguments)]
    fn maybe_submit_fetch(
        &self,
        viewport: ViewportId,
        chrom: &str,
        fetch_start: i64,
        fetch_end: i64,
        coverage_only: bool,
        scale: f64,
        block_during_navigation: bool,
    ) {
        if block_during_navigation && self.nav_state.read().unwrap().is_busy() {
            return;
        }

        let region = InFlightRegion {
            chrom: chrom.to_string(),
            start: fetch_start,
            end: fetch_end,
        };

        {
            let mut in_flight = self.in_flight.write().unwrap();
            if in_flight.get(&viewport) == Some(&region) {
                return;
            }
            in_flight.insert(viewport, region);
        }

        // Reads take priority: cancel any pending fetch or sampled-coverage
        // job already running for this viewport.
        let mut tokens = self.cancel_tokens.write().unwrap();
        if let Some(token) = tokens.remove(&viewport) {
            token.cancel();
        }
        let cancel = CancellationToken::new();
        tokens.insert(viewport, cancel.clone());
        drop(tokens);

        self.shared.loading.write().unwrap().insert(viewport);

        let _ = self.tx.send(WorkItem::Fetch {
            viewport,
            chrom: chrom.to_string(),
            start: fetch_start,
            end: fetch_end,
            coverage_only,
            scale,
            cancel,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_match_spec() {
        let config = Config::default();
        assert_eq!(config.max_bam_view_length, 500_000);
        assert!(config.smoothing_enabled);
    }

    #[test]
    fn test_in_flight_region_equality_drives_coalescing() {
        let a = InFlightRegion { chrom: "chr1".to_string(), start: 100, end: 200 };
        let b = InFlightRegion { chrom: "chr1".to_string(), start: 100, end: 200 };
        let c = InFlightRegion { chrom: "chr1".to_string(), start: 100, end: 201 };
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
