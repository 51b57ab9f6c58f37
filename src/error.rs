use thiserror::Error;

/// Errors raised by the core. Empty inputs and unknown ports are not errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid input at row {row}: {field} {reason}")]
    InvalidInput {
        row: usize,
        field: Field,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    VesselId,
    Timestamp,
    SpeedOverGround,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Field::VesselId => "vessel_id",
            Field::Timestamp => "timestamp",
            Field::SpeedOverGround => "speed_over_ground",
        };
        f.write_str(name)
    }
}

impl Error {
    pub(crate) fn missing(row: usize, field: Field) -> Self {
        Error::InvalidInput {
            row,
            field,
            reason: "is missing".to_owned(),
        }
    }

    pub(crate) fn invalid(row: usize, field: Field, reason: impl Into<String>) -> Self {
        Error::InvalidInput {
            row,
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
