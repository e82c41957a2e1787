use axum::{routing::get, Router};
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::scheduler::{ChannelNotifier, ReminderScheduler, ReminderStore, StorageError};
use crate::tle::{ElementSource, HttpFetcher, TleError};
use crate::tracker::TrackerError;

use super::api::{crew, notifications, predict, reminders, scheduler, tracker};
use super::api_doc::ApiDoc;
use super::auth::AppState;
use super::config::{Config, ConfigError};

const NOTIFICATION_BUFFER: usize = 256;

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("HTTP client setup failed: {0}")]
    Tle(#[from] TleError),
    #[error("reminder store: {0}")]
    Storage(#[from] StorageError),
    #[error("invalid observer: {0}")]
    Observer(#[from] TrackerError),
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Tracking
        .route("/api/iss-now", get(tracker::now))
        .route("/api/iss-info", get(tracker::info))
        .route("/api/future-trajectory", get(tracker::future_trajectory))
        .route("/api/next-passes", get(predict::list_passes))
        .route("/api/iss-crew", get(crew::list_crew))
        // Reminders
        .route(
            "/api/reminders",
            get(reminders::list_reminders).post(reminders::add_reminder),
        )
        .route("/api/notifications", get(notifications::stream_notifications))
        .route("/api/scheduler/status", get(scheduler::status))
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(config: Config) -> Result<(), ServeError> {
    let bind_addr = config.web.bind.clone();
    let observer = config.observer.observer()?;
    let pass_search = config.passes.search()?;
    config.reminders.validate()?;

    let source = ElementSource::new(
        config.tle.source_settings(),
        config.tle.cache(),
        HttpFetcher::new(config.tle.request_timeout)?,
    );
    let store = Arc::new(ReminderStore::open(&config.reminders.database)?);
    let notifier = ChannelNotifier::new(NOTIFICATION_BUFFER);
    let http = reqwest::Client::builder()
        .timeout(config.tle.request_timeout)
        .build()
        .map_err(TleError::from)?;

    let scheduler = ReminderScheduler::new(
        store.clone(),
        Arc::new(notifier.clone()),
        config.reminders.poll_interval,
    )
    .start();

    let state = AppState {
        config: Arc::new(config),
        source: Arc::new(source),
        store,
        notifier,
        scheduler: scheduler.monitor(),
        observer,
        pass_search,
        http,
    };

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    let served = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    scheduler.shutdown().await;
    served?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown requested");
}
