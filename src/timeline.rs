use crate::model::PositionRecord;
use std::collections::BTreeMap;

/// The records of one vessel in time order. Each entry keeps the record's index in the source
/// table.
#[derive(Debug, Clone, PartialEq)]
pub struct VesselTimeline<'a> {
    pub vessel_id: &'a str,
    pub entries: Vec<(usize, &'a PositionRecord)>,
}

impl<'a> VesselTimeline<'a> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &'a PositionRecord> + '_ {
        self.entries.iter().map(|(_, r)| *r)
    }
}

/// Groups the records selected by `keep` per vessel and sorts each group by timestamp.
///
/// The sort is stable, so records with equal timestamps keep their input order. Timelines are
/// returned in ascending vessel id order.
pub fn build_timelines<'a, F>(records: &'a [PositionRecord], keep: F) -> Vec<VesselTimeline<'a>>
where
    F: Fn(&PositionRecord) -> bool,
{
    let mut groups: BTreeMap<&'a str, Vec<(usize, &'a PositionRecord)>> = BTreeMap::new();
    for (idx, record) in records.iter().enumerate().filter(|(_, r)| keep(r)) {
        groups
            .entry(record.vessel_id.as_str())
            .or_default()
            .push((idx, record));
    }

    groups
        .into_iter()
        .map(|(vessel_id, mut entries)| {
            entries.sort_by_key(|(_, r)| r.timestamp);
            debug_assert!(entries
                .windows(2)
                .all(|p| p[0].1.timestamp <= p[1].1.timestamp));
            VesselTimeline { vessel_id, entries }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::parse_timestamp;
    use pretty_assertions::assert_eq;

    fn at(id: &str, ts: &str) -> PositionRecord {
        PositionRecord::new(id, parse_timestamp(ts).unwrap())
    }

    #[test]
    fn groups_and_sorts_per_vessel() {
        let records = vec![
            at("2", "2024-01-01T10:00:00"),
            at("1", "2024-01-01T12:00:00"),
            at("1", "2024-01-01T11:00:00"),
        ];
        let timelines = build_timelines(&records, |_| true);
        assert_eq!(timelines.len(), 2);
        assert_eq!(timelines[0].vessel_id, "1");
        let order: Vec<usize> = timelines[0].entries.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![2, 1]);
        assert_eq!(timelines[1].len(), 1);
    }

    #[test]
    fn equal_timestamps_keep_input_order() {
        let records = vec![
            at("1", "2024-01-01T10:00:00").with_port("B"),
            at("1", "2024-01-01T09:00:00"),
            at("1", "2024-01-01T10:00:00").with_port("A"),
        ];
        let timelines = build_timelines(&records, |_| true);
        let order: Vec<usize> = timelines[0].entries.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![1, 0, 2]);
    }

    #[test]
    fn keep_predicate_selects_records() {
        let records = vec![
            at("1", "2024-01-01T10:00:00").with_category("Cargo"),
            at("2", "2024-01-01T10:00:00"),
        ];
        let timelines = build_timelines(&records, |r| r.category.is_some());
        assert_eq!(timelines.len(), 1);
        assert_eq!(timelines[0].entries[0].0, 0);
    }
}
