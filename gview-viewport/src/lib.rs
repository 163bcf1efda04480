//! Per-viewport streaming cache: async fetch scheduling, incremental row
//! packing, sparse sampled coverage, and a bin-level coverage cache, built
//! over [`gview_core::AlignmentReader`].

#![warn(missing_docs)]

pub mod coverage_cache;
pub mod reader;
pub mod row_packing;
pub mod sample_file;
pub mod sampled_coverage;
mod smoothing;
pub mod viewport;
mod worker;

pub use coverage_cache::CoverageBins;
pub use reader::OpenReader;
pub use sample_file::{Config, SampleFile};
pub use sampled_coverage::SampledCoverage;
pub use viewport::{Decision, NavigationState, StackCache, ViewportId, MAX_BAM_VIEW_LENGTH_DEFAULT};
