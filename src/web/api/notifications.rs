use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::stream::{self, Stream};
use tokio::sync::broadcast::error::RecvError;

use crate::scheduler::NOTIFICATIONS_TOPIC;
use crate::web::auth::{AppState, AuthenticatedUser};

#[utoipa::path(
    get,
    path = "/api/notifications",
    tag = "reminders",
    responses(
        (status = 200, description = "Server-sent pass notifications for the caller", body = String, content_type = "text/event-stream"),
        (status = 401, description = "Missing or invalid API key")
    ),
    security(("api_key" = []))
)]
pub async fn stream_notifications(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.notifier.subscribe();
    let user_id = user.user_id;

    let events = stream::unfold(rx, move |mut rx| {
        let user_id = user_id.clone();
        async move {
            loop {
                match rx.recv().await {
                    Ok(notification) if notification.user_id == user_id => {
                        let event = match Event::default()
                            .event(NOTIFICATIONS_TOPIC)
                            .json_data(&notification)
                        {
                            Ok(event) => event,
                            Err(e) => {
                                log::warn!("Failed to encode notification: {}", e);
                                continue;
                            }
                        };
                        return Some((Ok(event), rx));
                    }
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        log::warn!("Notification stream for {} skipped {} messages", user_id, skipped);
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}
