//! Parses the BAI (BAM index) format and resolves a reference interval to a
//! minimal, merged, sorted list of virtual-offset chunks.

#![warn(missing_docs)]

pub mod chunk;
pub mod index;
pub mod reg2bin;
pub mod reader;

pub use chunk::Chunk;
pub use index::Index;
pub use reg2bin::reg2bins;
pub use reader::read_index;
