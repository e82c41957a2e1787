use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    crew::CrewError, predict::PredictError, scheduler::StorageError, tracker::TrackerError,
};

#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    Upstream(String),
    Propagation(String),
    Storage(StorageError),
    Internal(String),
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::EmptyUser | StorageError::PassTimeOutOfRange(_) => {
                ApiError::Validation(e.to_string())
            }
            _ => ApiError::Storage(e),
        }
    }
}

impl From<TrackerError> for ApiError {
    fn from(e: TrackerError) -> Self {
        match e {
            TrackerError::InvalidObserver(_)
            | TrackerError::InvalidInterval
            | TrackerError::InvalidDuration
            | TrackerError::TooManySamples(_, _) => ApiError::Validation(e.to_string()),
            _ => ApiError::Propagation(e.to_string()),
        }
    }
}

impl From<PredictError> for ApiError {
    fn from(e: PredictError) -> Self {
        match e {
            PredictError::Model(inner) => inner.into(),
            PredictError::InvalidHorizon => ApiError::Validation(e.to_string()),
        }
    }
}

impl From<CrewError> for ApiError {
    fn from(e: CrewError) -> Self {
        ApiError::Upstream(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::with_message("validation_failed", &msg)),
            )
                .into_response(),
            ApiError::Upstream(msg) => (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse::with_message("upstream_error", &msg)),
            )
                .into_response(),
            ApiError::Propagation(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::with_message("propagation_error", &msg)),
            )
                .into_response(),
            ApiError::Storage(e) => {
                log::error!("Reminder storage error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::with_message("storage_error", &e.to_string())),
                )
                    .into_response()
            }
            ApiError::Internal(msg) => {
                log::error!("Request task failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::with_message("internal_error", &msg)),
                )
                    .into_response()
            }
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn with_message(error: &str, message: &str) -> Self {
        ErrorResponse {
            error: error.to_string(),
            message: Some(message.to_string()),
        }
    }
}
