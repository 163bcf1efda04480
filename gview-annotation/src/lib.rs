//! Binary cache formats for gene/transcript and COSMIC annotation data.
//!
//! These caches live beside their source files and are regenerated whenever
//! their magic or version field doesn't match: a corrupt or stale cache is
//! never fatal, only a cue to re-derive it from the original annotation
//! source (out of scope for this crate, which only covers the on-disk
//! cache layout).

#![warn(missing_docs)]

pub mod cosmic_cache;
pub mod gene_cache;
pub mod io;
pub mod txnm_cache;

pub use cosmic_cache::{CosmicCache, CosmicEntry};
pub use gene_cache::{Exon, Gene, GeneCache, Transcript};
pub use txnm_cache::{NonManeGene, NonManeTranscript, TxnmCache};
