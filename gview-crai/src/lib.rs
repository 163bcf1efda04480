//! Parses the CRAI (CRAM index) gzipped TSV format and resolves reference
//! intervals to container/slice locations.

#![warn(missing_docs)]

pub mod index;
pub mod reader;
pub mod record;

pub use index::Index;
pub use reader::read_index;
pub use record::{Record, MULTI_REFERENCE, UNMAPPED};
