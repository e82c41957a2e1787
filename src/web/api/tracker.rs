use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::tle::Provenance;
use crate::tracker::{self, Position, SatelliteModel};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::auth::AppState;

const DEFAULT_TRAJECTORY_SECONDS: i64 = 3600;
const DEFAULT_INTERVAL_SECONDS: i64 = 60;

#[derive(Debug, Serialize, ToSchema)]
pub struct InfoResponse {
    #[serde(flatten)]
    pub position: Position,
    pub name: String,
    pub provenance: Provenance,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TrajectoryQuery {
    /// Seconds of trajectory to compute from now
    pub duration: Option<f64>,
    /// Seconds between samples
    pub interval: Option<f64>,
}

#[utoipa::path(
    get,
    path = "/api/iss-now",
    tag = "tracker",
    responses(
        (status = 200, description = "Current sub-satellite point", body = Position),
        (status = 500, description = "Propagation failed", body = ErrorResponse)
    )
)]
pub async fn now(State(state): State<AppState>) -> ApiResult<Json<Position>> {
    let elements = state.source.fetch().await;
    let position = tracker::position_at(&elements, Utc::now(), &state.observer)?;
    Ok(Json(position))
}

#[utoipa::path(
    get,
    path = "/api/iss-info",
    tag = "tracker",
    responses(
        (status = 200, description = "Current position with element set details", body = InfoResponse),
        (status = 500, description = "Propagation failed", body = ErrorResponse)
    )
)]
pub async fn info(State(state): State<AppState>) -> ApiResult<Json<InfoResponse>> {
    let elements = state.source.fetch().await;
    let position = tracker::position_at(&elements, Utc::now(), &state.observer)?;
    Ok(Json(InfoResponse {
        position,
        name: elements.name,
        provenance: elements.provenance,
    }))
}

#[utoipa::path(
    get,
    path = "/api/future-trajectory",
    tag = "tracker",
    params(TrajectoryQuery),
    responses(
        (status = 200, description = "Sampled trajectory starting now", body = Vec<Position>),
        (status = 400, description = "Invalid duration or interval", body = ErrorResponse)
    )
)]
pub async fn future_trajectory(
    State(state): State<AppState>,
    Query(query): Query<TrajectoryQuery>,
) -> ApiResult<Json<Vec<Position>>> {
    let duration = seconds(query.duration, DEFAULT_TRAJECTORY_SECONDS, "duration")?;
    let interval = seconds(query.interval, DEFAULT_INTERVAL_SECONDS, "interval")?;

    let elements = state.source.fetch().await;
    let model = SatelliteModel::new(&elements)?;
    let points = tracker::trajectory(&model, &state.observer, Utc::now(), duration, interval)?;
    Ok(Json(points))
}

fn seconds(value: Option<f64>, default: i64, field: &str) -> Result<Duration, ApiError> {
    match value {
        None => Ok(Duration::seconds(default)),
        Some(v) if v.is_finite() && v.abs() < 1e9 => Ok(Duration::milliseconds((v * 1000.0) as i64)),
        Some(v) => Err(ApiError::Validation(format!("{} {} is out of range", field, v))),
    }
}
