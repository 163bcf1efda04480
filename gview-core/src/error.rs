//! Error kinds shared across the alignment-reading stack.

use std::io;

/// An error produced while reading or decoding alignment data.
///
/// Variant names mirror the error kinds named in the design: most are
/// surfaced as a plain [`io::Error`] with [`io::ErrorKind::InvalidData`] or
/// [`io::ErrorKind::UnexpectedEof`] deep in a decoder, and get wrapped into
/// one of these at the boundary where a caller needs to branch on kind
/// (e.g. `IndexMissing` vs. a genuine parse failure).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A file's magic number did not match what was expected.
    #[error("invalid magic number in {context}")]
    InvalidMagic {
        /// What was being parsed when the mismatch was found.
        context: &'static str,
    },
    /// The file declares a format version older than the minimum supported.
    #[error("unsupported version: {found} (minimum supported: {minimum})")]
    UnsupportedVersion {
        /// The version found in the file.
        found: String,
        /// The minimum version this reader supports.
        minimum: String,
    },
    /// The underlying stream ended before a record or block was fully read.
    #[error("unexpected end of file")]
    UnexpectedEof,
    /// A BGZF block header was malformed.
    #[error("invalid bgzf block: {reason}")]
    InvalidBgzfBlock {
        /// Human-readable description of the anomaly.
        reason: &'static str,
    },
    /// Inflate or rANS decompression failed or produced the wrong size.
    #[error("decompression failure: {reason}")]
    DecompressionFailure {
        /// Human-readable description of the anomaly.
        reason: String,
    },
    /// A required index file (BAI/CRAI) could not be found.
    #[error("index file not found: {path}")]
    IndexMissing {
        /// Path that was probed for the index.
        path: String,
    },
    /// A requested chromosome name did not resolve after alias attempts.
    #[error("unknown reference sequence: {name}")]
    UnknownReference {
        /// The name as requested by the caller.
        name: String,
    },
    /// A persisted cache file failed its magic or version check.
    #[error("cache corrupt: {reason}")]
    CacheCorrupt {
        /// Human-readable description of the anomaly.
        reason: String,
    },
    /// A cooperative cancellation was observed; not a true failure.
    #[error("operation cancelled")]
    Cancelled,
    /// An I/O error that doesn't fit one of the named kinds above.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Returns `true` if this error represents a cooperative cancellation
    /// rather than a genuine failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<Error> for io::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::Io(e) => e,
            Error::UnexpectedEof => io::Error::from(io::ErrorKind::UnexpectedEof),
            other => io::Error::new(io::ErrorKind::InvalidData, other.to_string()),
        }
    }
}

/// A specialized [`Result`] for operations in the gview reader stack.
pub type Result<T> = std::result::Result<T, Error>;
