use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::predict::{next_passes, PassWindow};
use crate::tracker::GroundObserver;
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::auth::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct PassesQuery {
    /// Observer latitude in degrees
    pub lat: Option<String>,
    /// Observer longitude in degrees
    pub lon: Option<String>,
    /// Observer elevation in meters
    pub elevation: Option<String>,
    /// Number of passes to return
    pub count: Option<usize>,
}

#[utoipa::path(
    get,
    path = "/api/next-passes",
    tag = "predict",
    params(PassesQuery),
    responses(
        (status = 200, description = "Upcoming passes, earliest first", body = Vec<PassWindow>),
        (status = 400, description = "Invalid coordinates or count", body = ErrorResponse)
    )
)]
pub async fn list_passes(
    State(state): State<AppState>,
    Query(query): Query<PassesQuery>,
) -> ApiResult<Json<Vec<PassWindow>>> {
    let observer = observer_from_query(&query)?;

    let passes_config = &state.config.passes;
    let count = query.count.unwrap_or(passes_config.default_count);
    if count > passes_config.max_count {
        return Err(ApiError::Validation(format!(
            "count {} exceeds maximum of {}",
            count, passes_config.max_count
        )));
    }

    let elements = state.source.fetch().await;
    let search = state.pass_search;
    let passes = tokio::task::spawn_blocking(move || {
        next_passes(&elements, &observer, count, Utc::now(), &search)
    })
    .await??;

    Ok(Json(passes))
}

fn observer_from_query(query: &PassesQuery) -> Result<GroundObserver, ApiError> {
    let lat = parse_coordinate(query.lat.as_deref())?;
    let lon = parse_coordinate(query.lon.as_deref())?;
    let elevation = match query.elevation.as_deref() {
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| ApiError::Validation("Invalid elevation".into()))?,
        None => 0.0,
    };
    Ok(GroundObserver::new(lat, lon, elevation)?)
}

fn parse_coordinate(raw: Option<&str>) -> Result<f64, ApiError> {
    raw.and_then(|v| v.trim().parse::<f64>().ok())
        .ok_or_else(|| ApiError::Validation("Invalid coordinates".into()))
}
