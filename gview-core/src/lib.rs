//! Shared alignment record model, the [`reader::AlignmentReader`] capability
//! trait, and reference-aware mismatch resolution used by both the BAM and
//! CRAM decoders.

#![warn(missing_docs)]

pub mod cancel;
pub mod cigar;
pub mod error;
pub mod flags;
pub mod mismatch;
pub mod reader;
pub mod record;
pub mod refdict;
pub mod substitution;

pub use cancel::CancellationToken;
pub use cigar::{Kind as CigarKind, Op as CigarOp};
pub use error::{Error, Result};
pub use flags::Flags;
pub use reader::{AlignmentReader, ChunkProgress, Flow};
pub use record::{AlignmentRecord, Mismatch, UNPACKED_ROW};
pub use refdict::{ReferenceSource, SequenceDictionary};
pub use substitution::SubstitutionMatrix;
