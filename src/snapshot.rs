//! Immutable, precomputed view over one record table.
//!
//! Building a [`Snapshot`] runs the segmenter once per standing partition and the anchorage
//! calculator once over every vessel. Queries only filter and count those results, so category,
//! port, date and vessel selections never walk the timelines again. A new date selection is a new
//! snapshot; nothing in an existing one is mutated.
use crate::anchorage::{anchorage_intervals, AnchorageInterval, AnchorageMode};
use crate::error::Result;
use crate::filter::RecordFilter;
use crate::model::{Partition, PositionRecord};
use crate::segmenter::{segment, PortEvent};
use crate::summary::{port_summary, FleetSummary, PortSummaryRow};
use crate::table::RecordTable;
use crate::timeline::build_timelines;
use chrono::Timelike;
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq)]
struct StandingPartition {
    events: Vec<PortEvent>,
    port_summary: Vec<PortSummaryRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    table: RecordTable,
    mode: AnchorageMode,
    partitions: BTreeMap<Partition, StandingPartition>,
    intervals: Vec<AnchorageInterval>,
}

/// A category selection plus query-time criteria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub partition: Partition,
    pub filter: RecordFilter,
}

impl Default for Query {
    fn default() -> Self {
        Query {
            partition: Partition::All,
            filter: RecordFilter::all(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub port_summary: Vec<PortSummaryRow>,
    pub fleet_summary: FleetSummary,
}

impl Snapshot {
    /// Restricts `table` with `load_filter` and precomputes everything queries need.
    ///
    /// Fails if any retained record lacks a speed over ground.
    pub fn build(
        table: &RecordTable,
        load_filter: &RecordFilter,
        mode: AnchorageMode,
    ) -> Result<Self> {
        let table = if load_filter.is_empty() {
            table.clone()
        } else {
            table.filtered(load_filter)
        };
        let records = table.records();

        let all_timelines = build_timelines(records, |_| true);
        let intervals = anchorage_intervals(&all_timelines, mode)?;
        debug!(
            "{} vessels, {} anchorage intervals ({:?})",
            all_timelines.len(),
            intervals.len(),
            mode
        );

        let mut partitions = BTreeMap::new();
        for partition in Partition::STANDING {
            let events = match partition {
                Partition::All => segment(&all_timelines),
                p => segment(&build_timelines(records, |r| p.contains(r))),
            };
            let summary = port_summary(&events);
            debug!(
                "partition {:?}: {} port events, {} ports",
                partition,
                events.len(),
                summary.len()
            );
            partitions.insert(
                partition,
                StandingPartition {
                    events,
                    port_summary: summary,
                },
            );
        }

        info!("snapshot built from {} records", records.len());

        Ok(Snapshot {
            table,
            mode,
            partitions,
            intervals,
        })
    }

    pub fn table(&self) -> &RecordTable {
        &self.table
    }

    pub fn anchorage_mode(&self) -> AnchorageMode {
        self.mode
    }

    /// Port events of a standing partition, as produced by the segmenter.
    pub fn events(&self, partition: Partition) -> &[PortEvent] {
        self.partitions
            .get(&partition)
            .map(|p| p.events.as_slice())
            .unwrap_or_default()
    }

    pub fn intervals(&self) -> &[AnchorageInterval] {
        &self.intervals
    }

    /// Port table for a partition. A port-only filter narrows the precomputed rows; other
    /// criteria recount the partition's precomputed events.
    pub fn port_summary(
        &self,
        partition: Partition,
        filter: &RecordFilter,
    ) -> Vec<PortSummaryRow> {
        let Some(standing) = self.partitions.get(&partition) else {
            return Vec::new();
        };

        if filter.is_row_filter() {
            return match filter.port() {
                Some(port) => standing
                    .port_summary
                    .iter()
                    .filter(|row| row.port_name == port)
                    .cloned()
                    .collect(),
                None => standing.port_summary.clone(),
            };
        }

        port_summary(standing.events.iter().filter(|e| filter.matches_event(e)))
    }

    /// Fleet figures over the partition's records that pass `filter`.
    pub fn fleet_summary(
        &self,
        partition: Partition,
        filter: &RecordFilter,
    ) -> Result<FleetSummary> {
        let records = self.table.records();
        let selected = |r: &PositionRecord| partition.contains(r) && filter.matches_record(r);

        FleetSummary::compute(
            records.iter().filter(|r| selected(r)),
            self.intervals.iter().filter(|i| selected(&records[i.record])),
        )
    }

    pub fn query(&self, query: &Query) -> Result<Report> {
        Ok(Report {
            port_summary: self.port_summary(query.partition, &query.filter),
            fleet_summary: self.fleet_summary(query.partition, &query.filter)?,
        })
    }

    /// Distinct vessel categories present, sorted.
    pub fn categories(&self) -> Vec<&str> {
        self.distinct(|r| r.category.as_deref())
    }

    /// Distinct port labels present, sorted.
    pub fn ports(&self) -> Vec<&str> {
        self.distinct(|r| r.nearest_port.as_deref())
    }

    fn distinct<'a, F>(&'a self, field: F) -> Vec<&'a str>
    where
        F: Fn(&'a PositionRecord) -> Option<&'a str>,
    {
        self.table
            .records()
            .iter()
            .filter_map(field)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Number of distinct vessels reporting in each hour of the day. Hours without reports are
    /// absent.
    pub fn hourly_vessel_counts(
        &self,
        partition: Partition,
        filter: &RecordFilter,
    ) -> BTreeMap<u32, usize> {
        let mut seen: BTreeMap<u32, BTreeSet<&str>> = BTreeMap::new();
        for record in self
            .table
            .records()
            .iter()
            .filter(|r| partition.contains(r) && filter.matches_record(r))
        {
            seen.entry(record.timestamp.hour())
                .or_default()
                .insert(record.vessel_id.as_str());
        }
        seen.into_iter().map(|(hour, ids)| (hour, ids.len())).collect()
    }
}
