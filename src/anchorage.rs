use crate::error::Result;
use crate::timeline::VesselTimeline;
use chrono::{Duration, NaiveDateTime};
use rayon::prelude::*;
use std::str::FromStr;

/// How the duration of an anchored reading is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnchorageMode {
    /// Every zero-speed reading lasts until the vessel's next reading, whatever its speed.
    #[default]
    NextSample,
    /// A run of consecutive zero-speed readings is one interval, ending at the first moving
    /// reading.
    ContiguousRun,
}

impl FromStr for AnchorageMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "next-sample" => Ok(AnchorageMode::NextSample),
            "contiguous-run" => Ok(AnchorageMode::ContiguousRun),
            other => Err(format!("unknown anchorage mode {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorageInterval {
    pub vessel_id: String,
    pub start_timestamp: NaiveDateTime,
    /// `None` when there is no later reading to measure against.
    pub duration: Option<Duration>,
    /// Table index of the anchored record that starts the interval.
    pub record: usize,
}

/// Anchorage intervals of one vessel in time order.
///
/// Fails on the first record without a speed, even if it is not anchored.
pub fn anchorage_timeline(
    timeline: &VesselTimeline<'_>,
    mode: AnchorageMode,
) -> Result<Vec<AnchorageInterval>> {
    let mut intervals = Vec::new();
    let entries = &timeline.entries;

    for (pos, (idx, record)) in entries.iter().enumerate() {
        let sog = record.require_speed()?;
        if sog != 0.0 {
            continue;
        }

        let end = match mode {
            AnchorageMode::NextSample => entries.get(pos + 1),
            AnchorageMode::ContiguousRun => {
                let continues_run = pos > 0 && entries[pos - 1].1.is_anchored();
                if continues_run {
                    continue;
                }
                // Speeds after `pos` are validated when the loop reaches them.
                entries[pos + 1..]
                    .iter()
                    .find(|(_, r)| r.speed_over_ground.map_or(true, |s| s != 0.0))
            }
        };

        intervals.push(AnchorageInterval {
            vessel_id: timeline.vessel_id.to_owned(),
            start_timestamp: record.timestamp,
            duration: end.map(|(_, next)| next.timestamp - record.timestamp),
            record: *idx,
        });
    }
    Ok(intervals)
}

/// Anchorage intervals of all timelines, vessels processed in parallel.
pub fn anchorage_intervals(
    timelines: &[VesselTimeline<'_>],
    mode: AnchorageMode,
) -> Result<Vec<AnchorageInterval>> {
    let per_vessel = timelines
        .par_iter()
        .map(|t| anchorage_timeline(t, mode))
        .collect::<Result<Vec<_>>>()?;
    Ok(per_vessel.into_iter().flatten().collect())
}

/// Longest defined duration, `None` when no interval has one.
pub fn max_duration<'a>(
    intervals: impl IntoIterator<Item = &'a AnchorageInterval>,
) -> Option<Duration> {
    intervals.into_iter().filter_map(|i| i.duration).max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Field};
    use crate::model::{parse_timestamp, PositionRecord};
    use crate::table::RecordTable;
    use crate::timeline::build_timelines;
    use pretty_assertions::assert_eq;

    fn rec(id: &str, ts: &str, sog: f64) -> PositionRecord {
        PositionRecord::new(id, parse_timestamp(ts).unwrap()).with_speed(sog)
    }

    fn durations(records: &[PositionRecord], mode: AnchorageMode) -> Vec<Option<i64>> {
        anchorage_intervals(&build_timelines(records, |_| true), mode)
            .unwrap()
            .into_iter()
            .map(|i| i.duration.map(|d| d.num_minutes()))
            .collect()
    }

    #[test]
    fn next_sample_measures_until_following_reading() {
        let records = vec![
            rec("1", "2024-01-01T10:00:00", 0.0),
            rec("1", "2024-01-01T10:30:00", 0.0),
            rec("1", "2024-01-01T11:00:00", 5.0),
        ];
        assert_eq!(
            durations(&records, AnchorageMode::NextSample),
            vec![Some(30), Some(30)]
        );
    }

    #[test]
    fn last_anchored_reading_is_undefined() {
        let records = vec![
            rec("1", "2024-01-01T10:00:00", 3.0),
            rec("1", "2024-01-01T10:20:00", 0.0),
            rec("2", "2024-01-01T09:00:00", 0.0),
        ];
        assert_eq!(
            durations(&records, AnchorageMode::NextSample),
            vec![None, None]
        );
    }

    #[test]
    fn contiguous_run_spans_until_moving() {
        let records = vec![
            rec("1", "2024-01-01T10:00:00", 0.0),
            rec("1", "2024-01-01T10:30:00", 0.0),
            rec("1", "2024-01-01T11:00:00", 5.0),
            rec("1", "2024-01-01T12:00:00", 0.0),
        ];
        assert_eq!(
            durations(&records, AnchorageMode::ContiguousRun),
            vec![Some(60), None]
        );
    }

    #[test]
    fn missing_speed_is_invalid() {
        let table: RecordTable = vec![
            rec("1", "2024-01-01T10:00:00", 0.0),
            PositionRecord::new("1", parse_timestamp("2024-01-01T10:30:00").unwrap()),
        ]
        .into_iter()
        .collect();
        let timelines = build_timelines(table.records(), |_| true);
        let err = anchorage_intervals(&timelines, AnchorageMode::NextSample).unwrap_err();
        assert_eq!(err, Error::missing(1, Field::SpeedOverGround));
    }

    #[test]
    fn max_skips_undefined() {
        let records = vec![
            rec("1", "2024-01-01T10:00:00", 0.0),
            rec("1", "2024-01-01T12:00:00", 0.0),
        ];
        let timelines = build_timelines(&records, |_| true);
        let intervals = anchorage_intervals(&timelines, AnchorageMode::NextSample).unwrap();
        assert_eq!(max_duration(&intervals), Some(Duration::hours(2)));
        assert_eq!(max_duration(&intervals[1..]), None);
    }
}
