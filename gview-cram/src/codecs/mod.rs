//! CRAM data series codecs: the per-series encodings named by a
//! compression header's data series encoding map.

pub mod byte_array;
pub mod huffman;
pub mod numeric;
pub mod rans;

pub use huffman::HuffmanTable;
