//! The genome-browser backend core, assembled from its constituent crates
//! behind Cargo features: BAI-indexed BAM decoding, CRAI-indexed CRAM 3.0
//! decoding, reference-aware mismatch resolution, and the per-viewport
//! streaming cache. [`gview_core`] (the alignment record model, the
//! [`AlignmentReader`] trait, and reference-dictionary resolution) is
//! always available; everything else is opt-in so a caller that only needs
//! the BAM path, say, doesn't pull in the CRAM codec stack.
//!
//! ```toml
//! [dependencies]
//! gview = { version = "0.1", features = ["bam", "cram", "viewport"] }
//! ```

#![warn(missing_docs)]

pub mod region;

pub use gview_core::{
    AlignmentReader, AlignmentRecord, CancellationToken, ChunkProgress, CigarKind, CigarOp, Error,
    Flags, Flow, Mismatch, ReferenceSource, Result, SequenceDictionary, SubstitutionMatrix,
    UNPACKED_ROW,
};

#[cfg(feature = "bam")]
#[doc(inline)]
pub use gview_bam as bam;

#[cfg(feature = "cram")]
#[doc(inline)]
pub use gview_cram as cram;

#[cfg(feature = "viewport")]
#[doc(inline)]
pub use gview_viewport as viewport;

#[cfg(feature = "annotation")]
#[doc(inline)]
pub use gview_annotation as annotation;

#[cfg(feature = "viewport")]
pub use gview_viewport::OpenReader;

pub use region::Region;
