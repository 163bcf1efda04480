//! Parsing user-typed locus strings (`chr17:43,044,295-43,125,483`) into a
//! region against an opened file's [`SequenceDictionary`].

use std::fmt;

use gview_core::SequenceDictionary;

const MIN_POSITION: i64 = 1;

const UNMAPPED_NAME: &str = "*";
const ALL_NAME: &str = ".";

/// A genomic region, resolved against a file's reference dictionary.
///
/// A region is either mapped to a named reference sequence, unmapped
/// (`*`), or all records regardless of mapping (`.`).
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Region {
    /// A mapped interval on a named reference sequence.
    Mapped {
        /// Reference sequence name, as matched in the dictionary.
        name: String,
        /// 1-based inclusive start.
        start: i64,
        /// 1-based inclusive end, or `None` for "to the end of the
        /// reference sequence".
        end: Option<i64>,
    },
    /// Unmapped records (`*`).
    Unmapped,
    /// All records, mapped or not (`.`).
    All,
}

/// An error parsing a region string.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParseError {
    /// The input was empty.
    Empty,
    /// The reference sequence name is not in the dictionary.
    Invalid,
    /// The interval suffix could not be parsed as `start[-end]`.
    InvalidInterval,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "region string is empty"),
            Self::Invalid => write!(f, "reference sequence not found in dictionary"),
            Self::InvalidInterval => write!(f, "invalid start-end interval"),
        }
    }
}

impl std::error::Error for ParseError {}

impl Region {
    /// Creates a mapped region directly, without string parsing.
    pub fn mapped<S: Into<String>>(name: S, start: i64, end: Option<i64>) -> Self {
        Self::Mapped {
            name: name.into(),
            start,
            end,
        }
    }

    /// Parses `s` as `name[:start[-end]]`, `*`, or `.`, resolving `name`
    /// against `dictionary` (trying the `chr`-prefixed and -stripped
    /// aliases the same way [`SequenceDictionary::resolve`] does). A
    /// missing start defaults to 1; a missing end defaults to the
    /// reference sequence's length.
    pub fn parse(s: &str, dictionary: &SequenceDictionary) -> Result<Self, ParseError> {
        if s.is_empty() {
            return Err(ParseError::Empty);
        } else if s == UNMAPPED_NAME {
            return Ok(Self::Unmapped);
        } else if s == ALL_NAME {
            return Ok(Self::All);
        }

        if let Some(i) = s.rfind(':') {
            let prefix = &s[..i];
            let suffix = &s[i + 1..];

            if let Some((start, end)) = parse_interval(suffix) {
                if let Some(ref_id) = dictionary.resolve(prefix) {
                    let name = dictionary.name(ref_id).unwrap_or(prefix).to_string();
                    let length = dictionary.length(ref_id).map(i64::from);
                    let resolved_end = end.or(length);
                    return Ok(Self::mapped(name, start, resolved_end));
                }
                return Err(ParseError::Invalid);
            }
        }

        let ref_id = dictionary.resolve(s).ok_or(ParseError::Invalid)?;
        let name = dictionary.name(ref_id).unwrap_or(s).to_string();
        let end = dictionary.length(ref_id).map(i64::from);
        Ok(Self::mapped(name, MIN_POSITION, end))
    }

    /// The reference name this region refers to: the resolved name for a
    /// mapped region, or `"*"`/`"."` for the unmapped/all pseudo-regions.
    pub fn name(&self) -> &str {
        match self {
            Self::Mapped { name, .. } => name,
            Self::Unmapped => UNMAPPED_NAME,
            Self::All => ALL_NAME,
        }
    }
}

fn parse_interval(s: &str) -> Option<(i64, Option<i64>)> {
    let normalized = s.replace(',', "");

    if let Some((start_str, end_str)) = normalized.split_once('-') {
        let start: i64 = start_str.parse().ok()?;
        let end: i64 = end_str.parse().ok()?;
        Some((start, Some(end)))
    } else {
        let start: i64 = normalized.parse().ok()?;
        Some((start, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict() -> SequenceDictionary {
        SequenceDictionary::new(vec![("chr1".to_string(), 248_956_422), ("chrM".to_string(), 16_569)])
    }

    #[test]
    fn test_parse_full_interval() {
        let region = Region::parse("chr1:1,000-2,000", &dict()).unwrap();
        assert_eq!(region, Region::mapped("chr1", 1000, Some(2000)));
    }

    #[test]
    fn test_parse_name_only_defaults_to_full_length() {
        let region = Region::parse("chrM", &dict()).unwrap();
        assert_eq!(region, Region::mapped("chrM", 1, Some(16_569)));
    }

    #[test]
    fn test_parse_resolves_chr_alias() {
        let region = Region::parse("1:5-10", &dict()).unwrap();
        assert_eq!(region, Region::mapped("chr1", 5, Some(10)));
    }

    #[test]
    fn test_parse_unmapped_and_all() {
        assert_eq!(Region::parse("*", &dict()).unwrap(), Region::Unmapped);
        assert_eq!(Region::parse(".", &dict()).unwrap(), Region::All);
    }

    #[test]
    fn test_parse_unknown_reference_is_invalid() {
        assert_eq!(Region::parse("chrZZZ:1-10", &dict()).unwrap_err(), ParseError::Invalid);
    }

    #[test]
    fn test_parse_empty_is_rejected() {
        assert_eq!(Region::parse("", &dict()).unwrap_err(), ParseError::Empty);
    }
}
