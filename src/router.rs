use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;

use crate::handlers::google::{events_next_hour, save_credentials};
use crate::service::CalendarService;

/// Credential blobs are small; anything larger is rejected with 413.
pub const BODY_LIMIT: usize = 64 * 1024;

#[derive(Clone)]
pub struct NexusState {
    pub calendar: CalendarService,
    pub secret_key: Arc<str>,
}

impl NexusState {
    pub fn new(calendar: CalendarService, secret_key: impl Into<Arc<str>>) -> Self {
        Self {
            calendar,
            secret_key: secret_key.into(),
        }
    }
}

/// Build the application router, mounting the Google routes under `api_prefix`.
pub fn nexus_router(state: NexusState, api_prefix: &str) -> Router {
    let google = Router::new()
        .route("/google/credentials", post(save_credentials))
        .route("/google/events/next-hour", get(events_next_hour));

    let prefix = api_prefix.trim_matches('/');
    let app = if prefix.is_empty() {
        Router::new().merge(google)
    } else {
        Router::new().nest(&format!("/{prefix}"), google)
    };

    app.layer(DefaultBodyLimit::max(BODY_LIMIT)).with_state(state)
}
