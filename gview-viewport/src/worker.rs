//! The per-file worker: the single task that owns the reader and performs
//! every blocking decode, per §4.7/§5.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use gview_core::cancel::CancellationToken;
use gview_core::reader::{AlignmentReader, Flow};
use gview_core::AlignmentRecord;
use tokio::sync::{mpsc, watch};
use tracing::warn;

use crate::reader::OpenReader;
use crate::row_packing::{gap_for_scale, RowPacker};
use crate::sampled_coverage::SampledCoverage;
use crate::viewport::{StackCache, ViewportId};

/// How often, in wall-clock time, an in-progress fetch publishes a partial
/// snapshot.
const PUBLISH_INTERVAL: std::time::Duration = std::time::Duration::from_millis(100);

/// How many consecutive decode errors on this file get logged before the
/// worker goes quiet about further ones.
const MAX_LOGGED_ERRORS: usize = 3;

/// One unit of work submitted to the per-file worker.
pub enum WorkItem {
    /// Fetch reads for a viewport, row-packing incrementally unless
    /// `coverage_only` is set.
    Fetch {
        viewport: ViewportId,
        chrom: String,
        start: i64,
        end: i64,
        coverage_only: bool,
        scale: f64,
        cancel: CancellationToken,
    },
    /// Compute (or recompute) a sampled-coverage profile for a viewport.
    SampledCoverage {
        viewport: ViewportId,
        chrom: String,
        start: i64,
        end: i64,
        num_samples: usize,
        smoothing_enabled: bool,
        cancel: CancellationToken,
    },
}

/// Shared, atomically-swapped state the worker publishes into and the
/// facade reads from.
pub struct SharedState {
    pub stack_caches: RwLock<HashMap<ViewportId, Arc<StackCache>>>,
    pub sampled_coverage: RwLock<HashMap<ViewportId, Arc<SampledCoverage>>>,
    pub loading: RwLock<std::collections::HashSet<ViewportId>>,
    pub redraw: watch::Sender<u64>,
}

impl SharedState {
    pub fn new() -> Self {
        let (redraw, _rx) = watch::channel(0);
        Self {
            stack_caches: RwLock::new(HashMap::new()),
            sampled_coverage: RwLock::new(HashMap::new()),
            loading: RwLock::new(std::collections::HashSet::new()),
            redraw,
        }
    }

    fn publish_stack(&self, viewport: ViewportId, cache: StackCache) {
        self.stack_caches.write().unwrap().insert(viewport, Arc::new(cache));
        self.bump_redraw();
    }

    fn publish_sampled_coverage(&self, viewport: ViewportId, profile: SampledCoverage) {
        self.sampled_coverage.write().unwrap().insert(viewport, Arc::new(profile));
        self.bump_redraw();
    }

    fn bump_redraw(&self) {
        let next = self.redraw.borrow().wrapping_add(1);
        let _ = self.redraw.send(next);
    }

    fn set_loading(&self, viewport: ViewportId, loading: bool) {
        let mut guard = self.loading.write().unwrap();
        if loading {
            guard.insert(viewport);
        } else {
            guard.remove(&viewport);
        }
    }
}

/// Runs the worker loop until the command channel closes.
pub async fn run(
    mut reader: OpenReader,
    mut rx: mpsc::UnboundedReceiver<WorkItem>,
    shared: Arc<SharedState>,
) {
    let mut error_count = 0usize;

    while let Some(item) = rx.recv().await {
        match item {
            WorkItem::Fetch {
                viewport,
                chrom,
                start,
                end,
                coverage_only,
                scale,
                cancel,
            } => {
                let previous_version = shared
                    .stack_caches
                    .read()
                    .unwrap()
                    .get(&viewport)
                    .map(|c| c.version)
                    .unwrap_or(0);

                let result = fetch(&mut reader, &shared, viewport, &chrom, start, end, coverage_only, scale, previous_version, &cancel);

                shared.set_loading(viewport, false);

                if let Err(e) = result {
                    if e.is_cancelled() {
                        // Cooperative cancel: previous snapshot stands, not an error.
                    } else {
                        error_count += 1;
                        if error_count <= MAX_LOGGED_ERRORS {
                            warn!(path = %reader.path().display(), error = %e, "fetch failed");
                        }
                    }
                }
            }
            WorkItem::SampledCoverage {
                viewport,
                chrom,
                start,
                end,
                num_samples,
                smoothing_enabled,
                cancel,
            } => {
                let result = run_sampled_coverage(&mut reader, &shared, viewport, &chrom, start, end, num_samples, smoothing_enabled, &cancel);
                shared.set_loading(viewport, false);

                if let Err(e) = result {
                    if !e.is_cancelled() {
                        error_count += 1;
                        if error_count <= MAX_LOGGED_ERRORS {
                            warn!(path = %reader.path().display(), error = %e, "sampled coverage failed");
                        }
                    }
                }
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn fetch(
    reader: &mut OpenReader,
    shared: &SharedState,
    viewport: ViewportId,
    chrom: &str,
    start: i64,
    end: i64,
    coverage_only: bool,
    scale: f64,
    previous_version: u64,
    cancel: &CancellationToken,
) -> gview_core::error::Result<()> {
    let gap = gap_for_scale(scale);
    let mut packer = RowPacker::new();
    let mut buffer: Vec<AlignmentRecord> = Vec::new();
    let mut last_publish = Instant::now();

    reader.query_streaming_cancellable(chrom, start, end, cancel, |mut record| {
        if !coverage_only {
            record.row = packer.assign(record.pos, record.end, gap);
        }
        buffer.push(record);

        if last_publish.elapsed() >= PUBLISH_INTERVAL {
            shared.publish_stack(
                viewport,
                StackCache {
                    chrom: chrom.to_string(),
                    start,
                    end,
                    scale,
                    coverage_only,
                    records: buffer.clone(),
                    max_row: packer.max_row(),
                    version: previous_version + 1,
                },
            );
            last_publish = Instant::now();
        }

        Flow::Continue
    })?;

    shared.publish_stack(
        viewport,
        StackCache {
            chrom: chrom.to_string(),
            start,
            end,
            scale,
            coverage_only,
            records: buffer,
            max_row: packer.max_row(),
            version: previous_version + 1,
        },
    );

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_sampled_coverage(
    reader: &mut OpenReader,
    shared: &SharedState,
    viewport: ViewportId,
    chrom: &str,
    start: i64,
    end: i64,
    num_samples: usize,
    smoothing_enabled: bool,
    cancel: &CancellationToken,
) -> gview_core::error::Result<()> {
    let mut profile = SampledCoverage::new(chrom.to_string(), start, end, num_samples);
    let positions = profile.positions.clone();
    let window = profile.window;
    let mut counts = vec![0u32; positions.len()];

    let on_chunk = |partial_counts: &[u32]| {
        let mut partial = SampledCoverage::new(chrom.to_string(), start, end, num_samples);
        partial.on_chunk_done(partial_counts);
        shared.publish_sampled_coverage(viewport, partial);
    };

    reader.query_sampled_counts(chrom, &positions, window, &mut counts, cancel, Some(on_chunk))?;

    profile.on_chunk_done(&counts);
    profile.finalize(smoothing_enabled);
    shared.publish_sampled_coverage(viewport, profile);

    Ok(())
}
