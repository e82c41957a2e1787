use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

use super::api::{crew, error::ErrorResponse, notifications, predict, reminders, scheduler, tracker};

#[derive(OpenApi)]
#[openapi(
    paths(
        tracker::now,
        tracker::info,
        tracker::future_trajectory,
        predict::list_passes,
        crew::list_crew,
        reminders::add_reminder,
        reminders::list_reminders,
        notifications::stream_notifications,
        scheduler::status,
    ),
    components(
        schemas(
            ErrorResponse,
            tracker::InfoResponse,
            reminders::AddReminderRequest,
            reminders::AddReminderResponse,
            reminders::AddReminderStatus,
            crate::tracker::Position,
            crate::tle::Provenance,
            crate::predict::PassWindow,
            crate::crew::CrewMember,
            crate::scheduler::Reminder,
            crate::scheduler::Notification,
            crate::scheduler::SchedulerState,
            crate::scheduler::SchedulerStatus,
        )
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Orbit Watch API",
        description = "Live ISS position, pass predictions and pass reminders",
        version = "0.1.0"
    ),
    tags(
        (name = "tracker", description = "Current position and ground track"),
        (name = "predict", description = "Pass prediction"),
        (name = "crew", description = "People aboard"),
        (name = "reminders", description = "Pass reminders and notifications")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}
