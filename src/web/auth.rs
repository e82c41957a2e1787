use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::predict::PassSearch;
use crate::scheduler::{ChannelNotifier, ReminderStore, SchedulerMonitor};
use crate::tle::ElementSource;
use crate::tracker::GroundObserver;

use super::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub source: Arc<ElementSource>,
    pub store: Arc<ReminderStore>,
    pub notifier: ChannelNotifier,
    pub scheduler: SchedulerMonitor,
    pub observer: GroundObserver,
    pub pass_search: PassSearch,
    pub http: reqwest::Client,
}

/// Identity resolved for the current request.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: String,
}

pub enum AuthError {
    MissingAuth,
    InvalidFormat,
    InvalidKey,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingAuth => (StatusCode::UNAUTHORIZED, "Missing Authorization header"),
            AuthError::InvalidFormat => (StatusCode::UNAUTHORIZED, "Invalid Authorization format"),
            AuthError::InvalidKey => (StatusCode::UNAUTHORIZED, "Invalid API key"),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .ok_or(AuthError::MissingAuth)?
            .to_str()
            .map_err(|_| AuthError::InvalidFormat)?;

        let key = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidFormat)?;

        let user = state.config.find_user(key).ok_or(AuthError::InvalidKey)?;

        Ok(AuthenticatedUser {
            user_id: user.user_id.clone(),
        })
    }
}
