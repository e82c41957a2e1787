use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("invalid tle: {0}")]
    InvalidTle(#[from] sgp4::TleError),
    #[error("elements error: {0}")]
    Elements(#[from] sgp4::ElementsError),
    #[error("propagation error: {0}")]
    Propagation(String),
    #[error("invalid observer: {0}")]
    InvalidObserver(String),
    #[error("sampling interval must be positive")]
    InvalidInterval,
    #[error("duration must not be negative")]
    InvalidDuration,
    #[error("trajectory would need {0} samples, limit is {1}")]
    TooManySamples(i64, i64),
}

impl From<sgp4::Error> for TrackerError {
    fn from(err: sgp4::Error) -> Self {
        TrackerError::Propagation(err.to_string())
    }
}
