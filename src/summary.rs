use crate::anchorage::{max_duration, AnchorageInterval};
use crate::error::Result;
use crate::model::PositionRecord;
use crate::segmenter::{PortEvent, PortEventKind};
use chrono::Duration;
use std::collections::{BTreeMap, BTreeSet};

pub const PLACEHOLDER_FLAG: &str = "\u{1F3F3}";

const US: &str = "\u{1F1FA}\u{1F1F8}";
const CA: &str = "\u{1F1E8}\u{1F1E6}";
const MX: &str = "\u{1F1F2}\u{1F1FD}";

static PORT_FLAGS: [(&str, &str); 9] = [
    ("Port of Ensenada", MX),
    ("Port of Long Beach", US),
    ("Port of Los Angeles", US),
    ("Port of Oakland", US),
    ("Port of San Diego", US),
    ("Port of San Francisco", US),
    ("Port of Seattle", US),
    ("Port of Tacoma", US),
    ("Port of Vancouver", CA),
];

/// Flag glyph of a port's country, or the white flag for ports not in the table.
pub fn port_flag(port_name: &str) -> &'static str {
    PORT_FLAGS
        .iter()
        .find(|(name, _)| *name == port_name)
        .map_or(PLACEHOLDER_FLAG, |(_, flag)| *flag)
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PortSummaryRow {
    #[serde(rename = "FLAG")]
    pub flag: &'static str,
    #[serde(rename = "PORT NAME")]
    pub port_name: String,
    #[serde(rename = "ARRIVALS")]
    pub arrivals_count: u64,
    #[serde(rename = "DEPARTURES")]
    pub departures_count: u64,
}

/// Counts events per named port. At-sea events are skipped and ports without events never
/// appear. Rows are ordered by arrivals descending, then port name.
pub fn port_summary<'a>(
    events: impl IntoIterator<Item = &'a PortEvent>,
) -> Vec<PortSummaryRow> {
    let mut counts: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
    for event in events {
        let Some(port) = event.port_name.as_deref() else {
            continue;
        };
        let entry = counts.entry(port).or_default();
        match event.kind {
            PortEventKind::Arrival => entry.0 += 1,
            PortEventKind::Departure => entry.1 += 1,
        }
    }

    let mut rows: Vec<PortSummaryRow> = counts
        .into_iter()
        .map(|(port, (arrivals, departures))| PortSummaryRow {
            flag: port_flag(port),
            port_name: port.to_owned(),
            arrivals_count: arrivals,
            departures_count: departures,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.arrivals_count
            .cmp(&a.arrivals_count)
            .then_with(|| a.port_name.cmp(&b.port_name))
    });
    rows
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FleetSummary {
    pub unique_vessel_count: usize,
    pub moving_vessel_count: usize,
    pub anchored_vessel_count: usize,
    /// `None` when no anchorage interval has a defined duration.
    pub max_anchorage_duration: Option<Duration>,
}

impl FleetSummary {
    /// Fleet figures over `records`; `intervals` must already be restricted to the same records.
    pub fn compute<'a>(
        records: impl IntoIterator<Item = &'a PositionRecord>,
        intervals: impl IntoIterator<Item = &'a AnchorageInterval>,
    ) -> Result<Self> {
        let mut unique = BTreeSet::new();
        let mut moving = BTreeSet::new();
        let mut anchored = BTreeSet::new();

        for record in records {
            let sog = record.require_speed()?;
            let id = record.vessel_id.as_str();
            unique.insert(id);
            if sog > 0.0 {
                moving.insert(id);
            } else {
                anchored.insert(id);
            }
        }

        Ok(FleetSummary {
            unique_vessel_count: unique.len(),
            moving_vessel_count: moving.len(),
            anchored_vessel_count: anchored.len(),
            max_anchorage_duration: max_duration(intervals),
        })
    }

    pub fn display(&self) -> FleetSummaryDisplay {
        FleetSummaryDisplay {
            unique_vessels: group_thousands(self.unique_vessel_count),
            moving_vessels: group_thousands(self.moving_vessel_count),
            anchored_vessels: group_thousands(self.anchored_vessel_count),
            max_time_anchored: self
                .max_anchorage_duration
                .map_or_else(|| "N/A".to_owned(), format_hours),
        }
    }
}

/// Fleet figures formatted for presentation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FleetSummaryDisplay {
    pub unique_vessels: String,
    pub moving_vessels: String,
    pub anchored_vessels: String,
    pub max_time_anchored: String,
}

impl FleetSummaryDisplay {
    pub fn fields(&self) -> [(&'static str, &str); 4] {
        [
            ("Total Unique Vessels", self.unique_vessels.as_str()),
            ("Total Moving Vessels", self.moving_vessels.as_str()),
            ("Total Anchored Vessels", self.anchored_vessels.as_str()),
            ("Max Time Anchored (hours)", self.max_time_anchored.as_str()),
        ]
    }
}

fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn format_hours(duration: Duration) -> String {
    format!("{:.2}", duration.num_seconds() as f64 / 3600.0)
}
