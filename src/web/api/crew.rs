use axum::{extract::State, Json};

use crate::crew::{fetch_crew, CrewMember};
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::auth::AppState;

#[utoipa::path(
    get,
    path = "/api/iss-crew",
    tag = "crew",
    responses(
        (status = 200, description = "People aboard the tracked craft", body = Vec<CrewMember>),
        (status = 502, description = "Crew roster unavailable", body = ErrorResponse)
    )
)]
pub async fn list_crew(State(state): State<AppState>) -> ApiResult<Json<Vec<CrewMember>>> {
    let crew_config = &state.config.crew;
    let crew = fetch_crew(&state.http, &crew_config.url, &crew_config.craft).await?;
    Ok(Json(crew))
}
