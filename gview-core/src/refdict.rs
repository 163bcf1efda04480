//! Reference-name resolution and the reference-base supplier contract.

use indexmap::IndexMap;

/// A reference sequence dictionary: ordered reference names with lengths,
/// as read from a BAM/CRAM header, with `chr`-prefix aliasing for lookups.
#[derive(Clone, Debug, Default)]
pub struct SequenceDictionary {
    names: IndexMap<String, i32>,
    lengths: Vec<i32>,
}

impl SequenceDictionary {
    /// Builds a dictionary from an ordered list of `(name, length)` pairs.
    pub fn new(entries: Vec<(String, i32)>) -> Self {
        let mut names = IndexMap::with_capacity(entries.len());
        let mut lengths = Vec::with_capacity(entries.len());

        for (i, (name, length)) in entries.into_iter().enumerate() {
            names.insert(name, i as i32);
            lengths.push(length);
        }

        Self { names, lengths }
    }

    /// Resolves a chromosome name to a reference id, trying, in order: the
    /// name as given, `"chr" + name`, and (if the name starts with `"chr"`)
    /// the name with that prefix stripped.
    pub fn resolve(&self, chrom: &str) -> Option<i32> {
        if let Some(&id) = self.names.get(chrom) {
            return Some(id);
        }

        let with_prefix = format!("chr{chrom}");
        if let Some(&id) = self.names.get(with_prefix.as_str()) {
            return Some(id);
        }

        if let Some(stripped) = chrom.strip_prefix("chr") {
            if let Some(&id) = self.names.get(stripped) {
                return Some(id);
            }
        }

        None
    }

    /// The reference name at `id`, if any.
    pub fn name(&self, id: i32) -> Option<&str> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.names.get_index(i))
            .map(|(name, _)| name.as_str())
    }

    /// The reference length at `id`, if any.
    pub fn length(&self, id: i32) -> Option<i32> {
        usize::try_from(id).ok().and_then(|i| self.lengths.get(i)).copied()
    }

    /// All reference names, in dictionary order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }

    /// All reference lengths, in dictionary order.
    pub fn lengths(&self) -> &[i32] {
        &self.lengths
    }

    /// The number of reference sequences.
    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    /// Whether the dictionary has no reference sequences.
    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }
}

/// A supplier of uppercase reference bases, used by the mismatch resolver
/// and the CRAM substitution-code path.
///
/// Implementations are expected to be re-entrant; any internal locking or
/// async prefetching is the implementation's own concern (see the design
/// notes on reference-base acquisition).
pub trait ReferenceSource {
    /// Returns uppercase reference bases for `chrom` over the 1-based,
    /// inclusive interval `[start, end]`, or `None` if the bases are not
    /// currently available (e.g. not yet loaded). Callers must degrade to
    /// "no mismatch detail" rather than block when this returns `None`.
    fn bases(&self, chrom: &str, start: i64, end: i64) -> Option<String>;
}
