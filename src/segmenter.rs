//! Arrival and departure detection from changes of the nearest-port label.
//!
//! Each vessel timeline is scanned pairwise. When the label of a record differs from its
//! successor's, the vessel departed the old label and arrived at the new one. A missing label is
//! the "at sea" pseudo-port and compares unequal to every named port, so a vessel going from
//! `Port A` to sea produces `Departure(Port A)` and `Arrival(None)`.
//!
//! Records sharing a timestamp are compared in input order; a label change between them is
//! reported like any other.
use crate::timeline::VesselTimeline;
use chrono::NaiveDateTime;
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortEventKind {
    Arrival,
    Departure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortEvent {
    pub vessel_id: String,
    /// `None` is the at-sea pseudo-port.
    pub port_name: Option<String>,
    pub kind: PortEventKind,
    /// Timestamp of the record at which the change was observed.
    pub timestamp: NaiveDateTime,
}

/// Port events of a single vessel, in timeline order.
pub fn segment_timeline(timeline: &VesselTimeline<'_>) -> Vec<PortEvent> {
    let mut events = Vec::new();
    for pair in timeline.entries.windows(2) {
        let (prev, next) = (pair[0].1, pair[1].1);
        if prev.nearest_port == next.nearest_port {
            continue;
        }
        events.push(PortEvent {
            vessel_id: timeline.vessel_id.to_owned(),
            port_name: prev.nearest_port.clone(),
            kind: PortEventKind::Departure,
            timestamp: next.timestamp,
        });
        events.push(PortEvent {
            vessel_id: timeline.vessel_id.to_owned(),
            port_name: next.nearest_port.clone(),
            kind: PortEventKind::Arrival,
            timestamp: next.timestamp,
        });
    }
    events
}

/// Port events of all timelines. Vessels are processed in parallel; output keeps timeline order.
pub fn segment(timelines: &[VesselTimeline<'_>]) -> Vec<PortEvent> {
    timelines
        .par_iter()
        .flat_map_iter(|t| segment_timeline(t))
        .collect()
}
