use thiserror::Error;

use crate::tracker::TrackerError;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("cannot build satellite model: {0}")]
    Model(#[from] TrackerError),
    #[error("search horizon must be positive")]
    InvalidHorizon,
}
