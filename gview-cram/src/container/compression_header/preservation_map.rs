//! The compression header's preservation map: flags and settings that hold
//! for every slice in the container.

use std::io::Read;

use gview_core::error::{Error, Result};
use gview_core::SubstitutionMatrix;

use crate::io::read_itf8;

/// One dictionary entry: an ordered list of 3-byte tag tokens (2-letter tag
/// name + 1-byte SAM type character) that a record's `TL` index selects.
pub type TagDictionaryEntry = Vec<(u8, u8, u8)>;

/// The compression header's preservation map (keys `RN`, `AP`, `RR`, `SM`,
/// `TD`).
#[derive(Clone, Debug)]
pub struct PreservationMap {
    /// Whether read names are stored per-record (`RN`).
    pub read_names_included: bool,
    /// Whether `AP` is delta-coded against the previous record's alignment
    /// start within a slice (`AP`).
    pub ap_delta: bool,
    /// Whether the reference sequence is required to decode this CRAM
    /// (`RR`).
    pub reference_required: bool,
    /// The substitution lookup built from the 5-byte `SM` matrix.
    pub substitution_matrix: SubstitutionMatrix,
    /// The tag dictionary indexed by a record's `TL` series value.
    pub tag_dictionary: Vec<TagDictionaryEntry>,
}

impl Default for PreservationMap {
    fn default() -> Self {
        Self {
            read_names_included: true,
            ap_delta: true,
            reference_required: true,
            substitution_matrix: SubstitutionMatrix::default(),
            tag_dictionary: Vec::new(),
        }
    }
}

/// Parses the preservation map from the compression header's byte stream.
///
/// Format: `itf8(byte size of map)`, `itf8(entry count)`, then per entry a
/// 2-byte key followed by a key-specific value: `RN`/`AP`/`RR` are a single
/// boolean byte, `SM` is 5 raw bytes, `TD` is an itf8-length-prefixed byte
/// string of NUL-separated dictionary entries, each a concatenation of
/// 3-byte tag tokens.
pub fn parse<R: Read>(reader: &mut R) -> Result<PreservationMap> {
    let map_size = read_itf8(reader)? as usize;
    let mut map_bytes = vec![0u8; map_size];
    reader.read_exact(&mut map_bytes).map_err(|_| Error::UnexpectedEof)?;
    let mut cursor: &[u8] = &map_bytes;

    let num_entries = read_itf8(&mut cursor)? as usize;

    let mut map = PreservationMap::default();

    for _ in 0..num_entries {
        let mut key = [0u8; 2];
        cursor.read_exact(&mut key).map_err(|_| Error::UnexpectedEof)?;

        match &key {
            b"RN" => map.read_names_included = read_bool(&mut cursor)?,
            b"AP" => map.ap_delta = read_bool(&mut cursor)?,
            b"RR" => map.reference_required = read_bool(&mut cursor)?,
            b"SM" => {
                let mut sm = [0u8; 5];
                cursor.read_exact(&mut sm).map_err(|_| Error::UnexpectedEof)?;
                map.substitution_matrix = SubstitutionMatrix::from_bytes(sm);
            }
            b"TD" => {
                let len = read_itf8(&mut cursor)? as usize;
                let mut td = vec![0u8; len];
                cursor.read_exact(&mut td).map_err(|_| Error::UnexpectedEof)?;
                map.tag_dictionary = parse_tag_dictionary(&td);
            }
            other => {
                return Err(Error::DecompressionFailure {
                    reason: format!(
                        "unknown preservation map key {:?}",
                        String::from_utf8_lossy(other)
                    ),
                })
            }
        }
    }

    Ok(map)
}

fn read_bool(cursor: &mut &[u8]) -> Result<bool> {
    let mut b = [0u8; 1];
    cursor.read_exact(&mut b).map_err(|_| Error::UnexpectedEof)?;
    Ok(b[0] != 0)
}

/// Splits the raw `TD` byte string on NUL into dictionary entries, each of
/// which is split into 3-byte tag tokens.
fn parse_tag_dictionary(td: &[u8]) -> Vec<TagDictionaryEntry> {
    td.split(|&b| b == 0)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry
                .chunks_exact(3)
                .map(|chunk| (chunk[0], chunk[1], chunk[2]))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn itf8(v: i32) -> Vec<u8> {
        let mut out = Vec::new();
        crate::io::itf8::write_itf8_for_test(&mut out, v);
        out
    }

    #[test]
    fn test_parse_tag_dictionary_multiple_entries() {
        // "NMCRGZ\0MDZ\0" -> entry0 = [(N,M,C), (R,G,Z)], entry1 = [(M,D,Z)]
        let mut td = Vec::new();
        td.extend_from_slice(b"NMC");
        td.extend_from_slice(b"RGZ");
        td.push(0);
        td.extend_from_slice(b"MDZ");
        let entries = parse_tag_dictionary(&td);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], vec![(b'N', b'M', b'C'), (b'R', b'G', b'Z')]);
        assert_eq!(entries[1], vec![(b'M', b'D', b'Z')]);
    }

    #[test]
    fn test_parse_minimal_map() {
        let mut body = Vec::new();
        body.extend_from_slice(&itf8(2)); // 2 entries
        body.extend_from_slice(b"RN");
        body.push(0);
        body.extend_from_slice(b"AP");
        body.push(1);

        let mut data = Vec::new();
        data.extend_from_slice(&itf8(body.len() as i32));
        data.extend_from_slice(&body);

        let map = parse(&mut &data[..]).unwrap();
        assert!(!map.read_names_included);
        assert!(map.ap_delta);
        // RR and SM fall back to defaults when absent from the map.
        assert!(map.reference_required);
    }
}
