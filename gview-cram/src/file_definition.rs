//! The CRAM file definition: 4-byte magic, version, and 20-byte file id.

use std::io::Read;

use gview_core::error::{Error, Result};

const MAGIC: [u8; 4] = *b"CRAM";
const FILE_ID_LEN: usize = 20;

/// A CRAM format version.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Version {
    /// Major version; this decoder requires at least 3.
    pub major: u8,
    /// Minor version.
    pub minor: u8,
}

/// The parsed file definition.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileDefinition {
    /// The format version.
    pub version: Version,
    /// The 20-byte file id (arbitrary, often all zero).
    pub file_id: [u8; FILE_ID_LEN],
}

/// Reads and validates the file definition, rejecting `major < 3`.
pub fn read_file_definition<R: Read>(reader: &mut R) -> Result<FileDefinition> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic).map_err(|_| Error::UnexpectedEof)?;
    if magic != MAGIC {
        return Err(Error::InvalidMagic { context: "CRAM file" });
    }

    let mut version_bytes = [0u8; 2];
    reader
        .read_exact(&mut version_bytes)
        .map_err(|_| Error::UnexpectedEof)?;
    let version = Version {
        major: version_bytes[0],
        minor: version_bytes[1],
    };

    if version.major < 3 {
        return Err(Error::UnsupportedVersion {
            found: format!("{}.{}", version.major, version.minor),
            minimum: "3.0".to_string(),
        });
    }

    let mut file_id = [0u8; FILE_ID_LEN];
    reader.read_exact(&mut file_id).map_err(|_| Error::UnexpectedEof)?;

    Ok(FileDefinition { version, file_id })
}
