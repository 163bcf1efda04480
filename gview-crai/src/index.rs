//! Query support over a parsed CRAI index.

use crate::record::Record;

/// A parsed CRAI index: the flat list of per-slice records, in file order.
#[derive(Clone, Debug, Default)]
pub struct Index {
    records: Vec<Record>,
}

impl Index {
    /// Wraps a flat list of CRAI records.
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Returns the records for `seq_id` overlapping `[start, end)`, in file
    /// (container) order, with duplicate container offsets collapsed to
    /// distinct entries (several slices may share a container).
    pub fn query(&self, seq_id: i32, start: i64, end: i64) -> Vec<Record> {
        self.records
            .iter()
            .filter(|r| r.seq_id == seq_id && r.overlaps(start, end))
            .copied()
            .collect()
    }

    /// The distinct, sorted container offsets a query's records live in.
    pub fn container_offsets(records: &[Record]) -> Vec<u64> {
        let mut offsets: Vec<u64> = records.iter().map(|r| r.container_offset).collect();
        offsets.sort_unstable();
        offsets.dedup();
        offsets
    }

    /// All records.
    pub fn records(&self) -> &[Record] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(seq_id: i32, start: i64, span: i64, container_offset: u64) -> Record {
        Record {
            seq_id,
            alignment_start: start,
            alignment_span: span,
            container_offset,
            slice_offset: 0,
            slice_size: 10,
        }
    }

    #[test]
    fn test_query_filters_by_overlap_and_seq_id() {
        let index = Index::new(vec![
            rec(0, 1, 100, 0),
            rec(0, 500, 100, 200),
            rec(1, 1, 100, 400),
        ]);

        let results = index.query(0, 50, 60);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].container_offset, 0);
    }

    #[test]
    fn test_container_offsets_dedup() {
        let records = vec![rec(0, 1, 10, 100), rec(0, 11, 10, 100), rec(0, 21, 10, 200)];
        assert_eq!(Index::container_offsets(&records), vec![100, 200]);
    }
}
