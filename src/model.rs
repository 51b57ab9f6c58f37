use crate::error::{Error, Field, Result};
use chrono::{DateTime, NaiveDateTime};
use std::str::FromStr;

// `%.f` takes an optional fractional part.
const TIMESTAMP_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S%.f",
];

#[derive(Debug, Default, Clone, serde::Deserialize)]
// One row of the AIS export. Only the columns below are read, the rest are ignored.
//   MMSI              vessel identifier (integer or string)
//   BaseDateTime      report timestamp, e.g. 2024-01-01T00:00:02
//   SOG               speed over ground in knots
//   Nearest Port      port label resolved upstream, empty while at sea
//   Vessel Type Name  category label, e.g. Cargo, Passenger, Tanker
//   VesselName        display name
// example: 367001234,2024-01-01T00:00:02,...,0.0,...,Port of Los Angeles,Cargo
pub struct RawRecord {
    #[serde(rename = "MMSI")]
    pub vessel_id: Option<String>,
    #[serde(rename = "BaseDateTime")]
    pub timestamp: Option<String>,
    #[serde(rename = "SOG")]
    pub sog: Option<String>,
    #[serde(rename = "Nearest Port")]
    pub nearest_port: Option<String>,
    #[serde(rename = "Vessel Type Name")]
    pub category: Option<String>,
    #[serde(rename = "VesselName")]
    pub vessel_name: Option<String>,
}

/// A validated position report. Speed stays optional until anchorage or fleet figures need it.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionRecord {
    /// Zero-based position of the row in the input, kept through filtering for error reporting.
    pub row: usize,
    pub vessel_id: String,
    pub timestamp: NaiveDateTime,
    pub speed_over_ground: Option<f64>,
    pub nearest_port: Option<String>,
    pub category: Option<String>,
    pub vessel_name: Option<String>,
}

impl PositionRecord {
    pub fn new(vessel_id: impl Into<String>, timestamp: NaiveDateTime) -> Self {
        PositionRecord {
            row: 0,
            vessel_id: vessel_id.into(),
            timestamp,
            speed_over_ground: None,
            nearest_port: None,
            category: None,
            vessel_name: None,
        }
    }

    pub fn with_speed(mut self, sog: f64) -> Self {
        self.speed_over_ground = Some(sog);
        self
    }

    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.nearest_port = Some(port.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Validates a raw row. `row` is the zero-based position in the input.
    pub fn parse(row: usize, raw: RawRecord) -> Result<Self> {
        let vessel_id =
            non_blank(raw.vessel_id).ok_or_else(|| Error::missing(row, Field::VesselId))?;
        let timestamp =
            non_blank(raw.timestamp).ok_or_else(|| Error::missing(row, Field::Timestamp))?;
        let timestamp = parse_timestamp(&timestamp).ok_or_else(|| {
            Error::invalid(row, Field::Timestamp, format!("unparseable: {timestamp}"))
        })?;

        let speed_over_ground = match non_blank(raw.sog) {
            Some(sog) => Some(parse_speed(row, &sog)?),
            None => None,
        };

        Ok(PositionRecord {
            row,
            vessel_id,
            timestamp,
            speed_over_ground,
            nearest_port: non_blank(raw.nearest_port),
            category: non_blank(raw.category),
            vessel_name: non_blank(raw.vessel_name),
        })
    }

    /// Speed for computations that require it.
    pub fn require_speed(&self) -> Result<f64> {
        self.speed_over_ground
            .ok_or_else(|| Error::missing(self.row, Field::SpeedOverGround))
    }

    pub fn is_anchored(&self) -> bool {
        self.speed_over_ground == Some(0.0)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Parses a naive timestamp, or an RFC 3339 one converted to UTC.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.naive_utc())
        })
}

fn parse_speed(row: usize, value: &str) -> Result<f64> {
    let sog = f64::from_str(value).map_err(|_| {
        Error::invalid(row, Field::SpeedOverGround, format!("unparseable: {value}"))
    })?;
    if sog.is_nan() || sog < 0.0 {
        return Err(Error::invalid(
            row,
            Field::SpeedOverGround,
            format!("must be a non-negative number, got {value}"),
        ));
    }
    Ok(sog)
}

/// Category subsets that get a precomputed port table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Partition {
    All,
    Cargo,
    Passenger,
}

impl Partition {
    pub const STANDING: [Partition; 3] = [Partition::All, Partition::Cargo, Partition::Passenger];

    /// Category label as it appears in the input, `None` for [`Partition::All`].
    pub fn category(&self) -> Option<&'static str> {
        match self {
            Partition::All => None,
            Partition::Cargo => Some("Cargo"),
            Partition::Passenger => Some("Passenger"),
        }
    }

    pub fn contains(&self, record: &PositionRecord) -> bool {
        match self.category() {
            None => true,
            Some(category) => record.category.as_deref() == Some(category),
        }
    }
}

impl FromStr for Partition {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Partition::All),
            "cargo" => Ok(Partition::Cargo),
            "passenger" => Ok(Partition::Passenger),
            other => Err(format!("unknown vessel category {other}")),
        }
    }
}
