//! Low-level integer and bit-stream primitives used throughout the CRAM
//! decoder.

pub mod bitreader;
pub mod itf8;
pub mod ltf8;

pub use bitreader::BitReader;
pub use itf8::read_itf8;
pub use ltf8::read_ltf8;
