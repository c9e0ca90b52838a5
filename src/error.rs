//! Engine error type.

use thiserror::Error;

use forest_fire_common::ParamName;

#[derive(Debug, Error)]
pub enum FireError {
    /// A model or sweep parameter is out of range. Raised when a run or the
    /// runner is constructed, never mid-run.
    #[error("invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: String,
        value: f64,
        reason: &'static str,
    },

    /// A cell was placed outside the grid. Indicates a bug in initialisation.
    /// The sweep layout itself is malformed (empty axis, a name both
    /// fixed and variable, ...).
    #[error("invalid sweep configuration: {0}")]
    InvalidConfig(String),

    #[error("position ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBoundsPlacement { x: u32, y: u32, width: u32, height: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Serialize(String),
}

impl FireError {
    pub fn invalid(name: ParamName, value: f64, reason: &'static str) -> Self {
        FireError::InvalidParameter { name: name.as_str().to_string(), value, reason }
    }
}

pub type FireResult<T> = Result<T, FireError>;
