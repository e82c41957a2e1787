use axum::{extract::State, Json};

use crate::scheduler::SchedulerStatus;
use crate::web::auth::AppState;

#[utoipa::path(
    get,
    path = "/api/scheduler/status",
    tag = "reminders",
    responses(
        (status = 200, description = "Reminder scheduler status", body = SchedulerStatus)
    )
)]
pub async fn status(State(state): State<AppState>) -> Json<SchedulerStatus> {
    Json(state.scheduler.status())
}
