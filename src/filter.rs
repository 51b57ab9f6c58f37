use crate::model::PositionRecord;
use crate::segmenter::PortEvent;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// One filter axis. Vessel category is not a criterion: it selects a standing partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Criterion {
    /// Records at, or events referencing, this port.
    Port(String),
    /// Records whose port is one of these labels; at-sea records never match.
    PortIn(BTreeSet<String>),
    /// Records, or events, on this calendar date.
    Date(NaiveDate),
    Vessel(String),
}

impl Criterion {
    pub fn matches_record(&self, record: &PositionRecord) -> bool {
        match self {
            Criterion::Port(p) => record.nearest_port.as_deref() == Some(p.as_str()),
            Criterion::PortIn(ports) => record
                .nearest_port
                .as_ref()
                .is_some_and(|p| ports.contains(p)),
            Criterion::Date(d) => record.timestamp.date() == *d,
            Criterion::Vessel(v) => record.vessel_id == *v,
        }
    }

    pub fn matches_event(&self, event: &PortEvent) -> bool {
        match self {
            Criterion::Port(p) => event.port_name.as_deref() == Some(p.as_str()),
            Criterion::PortIn(ports) => event
                .port_name
                .as_ref()
                .is_some_and(|p| ports.contains(p)),
            Criterion::Date(d) => event.timestamp.date() == *d,
            Criterion::Vessel(v) => event.vessel_id == *v,
        }
    }
}

/// Conjunction of criteria. The empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    criteria: Vec<Criterion>,
}

impl RecordFilter {
    pub fn all() -> Self {
        RecordFilter::default()
    }

    pub fn with(mut self, criterion: Criterion) -> Self {
        self.criteria.push(criterion);
        self
    }

    pub fn and(mut self, other: RecordFilter) -> Self {
        self.criteria.extend(other.criteria);
        self
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn port(&self) -> Option<&str> {
        self.criteria.iter().find_map(|c| match c {
            Criterion::Port(p) => Some(p.as_str()),
            _ => None,
        })
    }

    /// True when a precomputed port table can answer the query with a row filter: nothing but
    /// at most one `Port` criterion. Two ports never match together, so they take the event path.
    pub(crate) fn is_row_filter(&self) -> bool {
        self.criteria.len() <= 1 && self.criteria.iter().all(|c| matches!(c, Criterion::Port(_)))
    }

    pub fn matches_record(&self, record: &PositionRecord) -> bool {
        self.criteria.iter().all(|c| c.matches_record(record))
    }

    pub fn matches_event(&self, event: &PortEvent) -> bool {
        self.criteria.iter().all(|c| c.matches_event(event))
    }
}

impl FromIterator<Criterion> for RecordFilter {
    fn from_iter<T: IntoIterator<Item = Criterion>>(iter: T) -> Self {
        RecordFilter {
            criteria: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::parse_timestamp;
    use crate::segmenter::PortEventKind;

    fn record() -> PositionRecord {
        PositionRecord::new("7", parse_timestamp("2024-01-02T08:00:00").unwrap())
            .with_port("Port of Oakland")
            .with_category("Cargo")
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(RecordFilter::all().matches_record(&record()));
    }

    #[test]
    fn criteria_are_conjunctive() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let filter = RecordFilter::all()
            .with(Criterion::Date(date))
            .with(Criterion::Port("Port of Oakland".into()));
        assert!(filter.matches_record(&record()));

        let filter = filter.and(RecordFilter::all().with(Criterion::Vessel("8".into())));
        assert!(!filter.matches_record(&record()));
    }

    #[test]
    fn port_allow_list_rejects_at_sea() {
        let allow: BTreeSet<String> = ["Port of Oakland".to_owned()].into();
        let at_sea = PositionRecord::new("1", parse_timestamp("2024-01-02T08:00:00").unwrap());
        let criterion = Criterion::PortIn(allow);
        assert!(criterion.matches_record(&record()));
        assert!(!criterion.matches_record(&at_sea));
    }

    #[test]
    fn port_criterion_is_a_row_filter() {
        let event = PortEvent {
            vessel_id: "7".into(),
            port_name: Some("Port of Oakland".into()),
            kind: PortEventKind::Arrival,
            timestamp: parse_timestamp("2024-01-02T08:00:00").unwrap(),
        };
        let filter = RecordFilter::all().with(Criterion::Port("Port of Oakland".into()));
        assert!(filter.matches_event(&event));
        assert!(filter.is_row_filter());
        assert_eq!(filter.port(), Some("Port of Oakland"));

        let jan_3 = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let dated = filter.clone().with(Criterion::Date(jan_3));
        assert!(!dated.matches_event(&event));
        assert!(!dated.is_row_filter());

        let two_ports = filter.with(Criterion::Port("Port of Tacoma".into()));
        assert!(!two_ports.matches_event(&event));
        assert!(!two_ports.is_row_filter());
    }
}
