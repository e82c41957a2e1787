use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::scheduler::Reminder;
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::auth::{AppState, AuthenticatedUser};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddReminderRequest {
    /// Pass start time, RFC 3339 with an explicit offset, e.g. 2024-08-30T10:15:00Z
    pub pass_time: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AddReminderStatus {
    Created,
    Duplicate,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddReminderResponse {
    pub status: AddReminderStatus,
    pub user_id: String,
    pub pass_time: DateTime<Utc>,
}

#[utoipa::path(
    post,
    path = "/api/reminders",
    tag = "reminders",
    request_body = AddReminderRequest,
    responses(
        (status = 201, description = "Reminder registered", body = AddReminderResponse),
        (status = 200, description = "Reminder already registered", body = AddReminderResponse),
        (status = 400, description = "Invalid pass time", body = ErrorResponse),
        (status = 401, description = "Missing or invalid API key")
    ),
    security(("api_key" = []))
)]
pub async fn add_reminder(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<AddReminderRequest>,
) -> ApiResult<(StatusCode, Json<AddReminderResponse>)> {
    let pass_time = parse_pass_time(&request.pass_time)?;

    let store = state.store.clone();
    let user_id = user.user_id.clone();
    let created = tokio::task::spawn_blocking(move || store.add(&user_id, pass_time)).await??;
    let (status, code) = if created {
        (AddReminderStatus::Created, StatusCode::CREATED)
    } else {
        (AddReminderStatus::Duplicate, StatusCode::OK)
    };

    Ok((
        code,
        Json(AddReminderResponse {
            status,
            user_id: user.user_id,
            pass_time,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/reminders",
    tag = "reminders",
    responses(
        (status = 200, description = "Caller's reminders", body = Vec<Reminder>),
        (status = 401, description = "Missing or invalid API key")
    ),
    security(("api_key" = []))
)]
pub async fn list_reminders(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<Vec<Reminder>>> {
    let store = state.store.clone();
    let reminders =
        tokio::task::spawn_blocking(move || store.for_user(&user.user_id)).await??;
    Ok(Json(reminders))
}

fn parse_pass_time(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            ApiError::Validation(format!(
                "pass_time must be an RFC 3339 timestamp with offset: {}",
                e
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_zone_qualified_times() {
        let expected = Utc.with_ymd_and_hms(2024, 8, 30, 10, 15, 0).unwrap();
        assert_eq!(parse_pass_time("2024-08-30T10:15:00Z").ok(), Some(expected));
        assert_eq!(parse_pass_time("2024-08-30T12:15:00+02:00").ok(), Some(expected));
    }

    #[test]
    fn rejects_naive_times() {
        assert!(parse_pass_time("2024-08-30T10:15:00").is_err());
        assert!(parse_pass_time("2024-08-30 10:15:00 UTC").is_err());
        assert!(parse_pass_time("").is_err());
    }
}
