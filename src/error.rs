use thiserror::Error;

/// Errors raised by the flight model and its configuration layer.
///
/// Numeric degeneracies (zero airspeed, centred stick) are not errors; they
/// are guarded where they occur. Only contract violations and load failures
/// surface here.
#[derive(Error, Debug)]
pub enum FlightError {
    #[error("invalid timestep: dt must be positive, got {0}")]
    InvalidTimestep(f64),

    #[error("invalid curve: {0}")]
    InvalidCurve(String),

    #[error("invalid aircraft configuration: {0}")]
    Config(String),

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FlightError>;

/// Reject NaN and non-positive step durations.
pub(crate) fn check_dt(dt: f64) -> Result<()> {
    if dt > 0.0 && dt.is_finite() {
        Ok(())
    } else {
        Err(FlightError::InvalidTimestep(dt))
    }
}
