use crate::error::Result;
use crate::filter::RecordFilter;
use crate::model::{PositionRecord, RawRecord};
use log::debug;

/// Validated, immutable set of position reports in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordTable {
    records: Vec<PositionRecord>,
}

impl RecordTable {
    /// Table over `records` in input order; each record's `row` is set to its position.
    pub fn new(mut records: Vec<PositionRecord>) -> Self {
        for (row, record) in records.iter_mut().enumerate() {
            record.row = row;
        }
        RecordTable { records }
    }

    /// Validates every row; the first invalid row fails the whole table.
    pub fn from_raw(rows: impl IntoIterator<Item = RawRecord>) -> Result<Self> {
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(row, raw)| PositionRecord::parse(row, raw))
            .collect::<Result<Vec<_>>>()?;
        debug!("validated {} position records", records.len());
        Ok(RecordTable { records })
    }

    /// New table holding the records that pass `filter`, input order and input rows preserved.
    pub fn filtered(&self, filter: &RecordFilter) -> Self {
        RecordTable {
            records: self
                .records
                .iter()
                .filter(|r| filter.matches_record(r))
                .cloned()
                .collect(),
        }
    }

    pub fn records(&self) -> &[PositionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<PositionRecord> for RecordTable {
    fn from_iter<T: IntoIterator<Item = PositionRecord>>(iter: T) -> Self {
        RecordTable::new(iter.into_iter().collect())
    }
}
