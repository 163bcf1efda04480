//! The CRAM SAM header container: a single container whose only block is
//! the `FILE_HEADER`, carrying the embedded SAM header text.

use std::io::Read;

use gview_core::error::{Error, Result};
use gview_core::SequenceDictionary;

use crate::block::{self, ContentType};
use crate::container::{self, ContainerHeader};

/// The parsed SAM header: raw text plus the reference dictionary rebuilt
/// from its `@SQ` lines (CRAM, unlike BAM, carries no separate binary
/// reference array; `@SQ SN:`/`LN:` are authoritative).
pub struct Header {
    /// Raw `@`-line SAM header text.
    pub text: String,
    /// Reference name/length dictionary, in `@SQ` order.
    pub reference_sequences: SequenceDictionary,
}

/// Reads the SAM header container: its [`ContainerHeader`] followed by one
/// `FILE_HEADER` block.
pub fn read_header<R: Read>(reader: &mut R) -> Result<Header> {
    let Some(ContainerHeader { .. }) = container::read_container_header(reader)? else {
        return Err(Error::UnexpectedEof);
    };

    let file_header_block = block::read_block(reader)?;
    if file_header_block.content_type != ContentType::FileHeader {
        return Err(Error::DecompressionFailure {
            reason: "expected FILE_HEADER as the SAM header container's only block".to_string(),
        });
    }

    let mut cursor: &[u8] = &file_header_block.data;
    let mut len_bytes = [0u8; 4];
    cursor.read_exact(&mut len_bytes).map_err(|_| Error::UnexpectedEof)?;
    let text_len = i32::from_le_bytes(len_bytes).max(0) as usize;

    let mut text_bytes = vec![0u8; text_len.min(cursor.len())];
    cursor
        .read_exact(&mut text_bytes)
        .map_err(|_| Error::UnexpectedEof)?;
    let text = String::from_utf8_lossy(&text_bytes).into_owned();

    let reference_sequences = reference_dictionary_from_text(&text);

    Ok(Header {
        text,
        reference_sequences,
    })
}

fn reference_dictionary_from_text(text: &str) -> SequenceDictionary {
    let mut entries = Vec::new();

    for line in text.lines() {
        let Some(rest) = line.strip_prefix("@SQ") else {
            continue;
        };

        let mut name = None;
        let mut length = None;
        for field in rest.split('\t') {
            if let Some(sn) = field.strip_prefix("SN:") {
                name = Some(sn.to_string());
            } else if let Some(ln) = field.strip_prefix("LN:") {
                length = ln.parse().ok();
            }
        }

        if let (Some(name), Some(length)) = (name, length) {
            entries.push((name, length));
        }
    }

    SequenceDictionary::new(entries)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_dictionary_from_text() {
        let text = "@HD\tVN:1.6\n@SQ\tSN:chr1\tLN:1000\n@SQ\tSN:chr2\tLN:2000\n";
        let dict = reference_dictionary_from_text(text);
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.name(0), Some("chr1"));
        assert_eq!(dict.length(1), Some(2000));
    }

    #[test]
    fn test_sample_name_from_text() {
        let text = "@RG\tID:rg1\tSM:sample-a\n";
        assert_eq!(sample_name_from_text(text), Some("sample-a".to_string()));
    }
}
