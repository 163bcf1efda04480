//! Parsing the BAM file header (`BAM\1` magic, SAM header text, reference
//! dictionary).

use gview_bgzf::Reader as BgzfReader;
use gview_core::error::{Error, Result};
use gview_core::SequenceDictionary;
use std::io::{Read, Seek};

const MAGIC: [u8; 4] = *b"BAM\x01";

/// The parsed BAM header: the raw SAM header text and the reference
/// sequence dictionary.
pub struct Header {
    /// Raw `@`-line SAM header text.
    pub text: String,
    /// Reference name/length dictionary, in header order.
    pub reference_sequences: SequenceDictionary,
}

/// Reads the BAM magic, header text, and reference dictionary from the
/// start of the file.
pub fn read_header<R: Read + Seek>(reader: &mut BgzfReader<R>) -> Result<Header> {
    let magic = reader.read_fully(4)?;
    if magic != MAGIC {
        return Err(Error::InvalidMagic { context: "BAM file" });
    }

    let l_text = reader.read_i32()? as usize;
    let text_bytes = reader.read_fully(l_text)?;
    let text = String::from_utf8_lossy(&text_bytes).into_owned();

    let n_ref = reader.read_i32()? as usize;
    let mut entries = Vec::with_capacity(n_ref);

    for _ in 0..n_ref {
        let l_name = reader.read_i32()? as usize;
        let mut name_bytes = reader.read_fully(l_name)?;
        name_bytes.pop(); // trailing NUL
        let name = String::from_utf8_lossy(&name_bytes).into_owned();
        let l_ref = reader.read_i32()?;
        entries.push((name, l_ref));
    }

    Ok(Header {
        text,
        reference_sequences: SequenceDictionary::new(entries),
    })
}

/// Extracts the sample name from the first `@RG` line's `SM:` field, if any.
pub fn sample_name_from_text(text: &str) -> Option<String> {
    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("@RG") {
            for field in rest.split('\t') {
                if let Some(sm) = field.strip_prefix("SM:") {
                    return Some(sm.to_string());
                }
            }
        }
    }
    None
}
