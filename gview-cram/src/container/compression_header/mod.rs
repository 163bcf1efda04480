//! The CRAM compression header: preservation map, data-series encoding
//! map, and tag encoding map, shared by every slice in a container.

pub mod encoding;
pub mod preservation_map;

use std::collections::HashMap;
use std::io::Read;

use gview_core::error::{Error, Result};

pub use encoding::Encoding;
pub use preservation_map::PreservationMap;

/// The data series keys named in §4.4, as 2-byte identifiers.
pub type SeriesKey = [u8; 2];

/// Packs a 3-byte tag token (2-letter name + type character) into a `u32`
/// key for the tag encoding map.
pub fn pack_tag_key(tag: (u8, u8, u8)) -> u32 {
    (u32::from(tag.0) << 16) | (u32::from(tag.1) << 8) | u32::from(tag.2)
}

/// A parsed compression header.
#[derive(Clone, Debug)]
pub struct CompressionHeader {
    /// The preservation map.
    pub preservation_map: PreservationMap,
    /// Data series encoding map, keyed by 2-letter series id. A series
    /// absent from the map decodes to zero/empty via [`Encoding::Null`].
    pub data_series: HashMap<SeriesKey, Encoding>,
    /// Tag encoding map, keyed by [`pack_tag_key`] of the 3-byte tag token.
    pub tag_encodings: HashMap<u32, Encoding>,
}

impl CompressionHeader {
    /// Looks up a data series' encoding, defaulting to [`Encoding::Null`]
    /// when the series was not declared by the writer.
    pub fn series(&self, key: &[u8; 2]) -> &Encoding {
        self.data_series.get(key).unwrap_or(&Encoding::Null)
    }

    /// Looks up a tag's encoding, if the writer declared one.
    pub fn tag_encoding(&self, tag: (u8, u8, u8)) -> Option<&Encoding> {
        self.tag_encodings.get(&pack_tag_key(tag))
    }

    /// Parses a compression header from a (decompressed) compression
    /// header block payload: preservation map, data series encoding map,
    /// tag encoding map, each length-prefixed in that order.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut cursor: &[u8] = data;

        let preservation_map = preservation_map::parse(&mut cursor)?;
        let data_series = parse_data_series_map(&mut cursor)?;
        let tag_encodings = parse_tag_encoding_map(&mut cursor)?;

        Ok(Self {
            preservation_map,
            data_series,
            tag_encodings,
        })
    }
}

fn parse_data_series_map<R: Read>(reader: &mut R) -> Result<HashMap<SeriesKey, Encoding>> {
    let map_size = crate::io::read_itf8(reader)? as usize;
    let mut map_bytes = vec![0u8; map_size];
    reader.read_exact(&mut map_bytes).map_err(|_| Error::UnexpectedEof)?;
    let mut cursor: &[u8] = &map_bytes;

    let num_entries = crate::io::read_itf8(&mut cursor)? as usize;
    let mut map = HashMap::with_capacity(num_entries);

    for _ in 0..num_entries {
        let mut key = [0u8; 2];
        cursor.read_exact(&mut key).map_err(|_| Error::UnexpectedEof)?;
        let encoding = Encoding::parse(&mut cursor)?;
        map.insert(key, encoding);
    }

    Ok(map)
}

fn parse_tag_encoding_map<R: Read>(reader: &mut R) -> Result<HashMap<u32, Encoding>> {
    let map_size = crate::io::read_itf8(reader)? as usize;
    let mut map_bytes = vec![0u8; map_size];
    reader.read_exact(&mut map_bytes).map_err(|_| Error::UnexpectedEof)?;
    let mut cursor: &[u8] = &map_bytes;

    let num_entries = crate::io::read_itf8(&mut cursor)? as usize;
    let mut map = HashMap::with_capacity(num_entries);

    for _ in 0..num_entries {
        // The tag key itself is stored as an ITF8-encoded packing of its
        // 3 bytes, not as 3 raw bytes.
        let packed_key = crate::io::read_itf8(&mut cursor)? as u32;
        let encoding = Encoding::parse(&mut cursor)?;
        map.insert(packed_key, encoding);
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn itf8(v: i32) -> Vec<u8> {
        let mut out = Vec::new();
        crate::io::itf8::write_itf8_for_test(&mut out, v);
        out
    }

    fn minimal_preservation_map() -> Vec<u8> {
        let body = itf8(0); // 0 entries
        let mut out = itf8(body.len() as i32);
        out.extend_from_slice(&body);
        out
    }

    fn null_encoding_descriptor() -> Vec<u8> {
        let mut out = itf8(0); // codec id = NULL
        out.extend_from_slice(&itf8(0)); // 0 params bytes
        out
    }

    #[test]
    fn test_parse_empty_compression_header() {
        let mut data = Vec::new();
        data.extend_from_slice(&minimal_preservation_map());

        // data series map: 1 entry, key "BF", NULL encoding
        let mut series_body = itf8(1);
        series_body.extend_from_slice(b"BF");
        series_body.extend_from_slice(&null_encoding_descriptor());
        data.extend_from_slice(&itf8(series_body.len() as i32));
        data.extend_from_slice(&series_body);

        // tag map: 0 entries
        let tag_body = itf8(0);
        data.extend_from_slice(&itf8(tag_body.len() as i32));
        data.extend_from_slice(&tag_body);

        let header = CompressionHeader::parse(&data).unwrap();
        assert!(matches!(header.series(b"BF"), Encoding::Null));
        assert!(matches!(header.series(b"CF"), Encoding::Null));
    }

    #[test]
    fn test_pack_tag_key() {
        assert_eq!(pack_tag_key((b'N', b'M', b'C')), 0x004e4d43);
    }
}
