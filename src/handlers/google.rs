use axum::{Json, extract::State};

use crate::middleware::auth::CurrentUser;
use crate::types::calendar::EventsResponse;
use crate::types::message::{Message, SaveCredentialsBody};
use crate::{NexusError, router::NexusState};

/// POST /google/credentials -> stores the caller's Google credential blob.
pub async fn save_credentials(
    State(state): State<NexusState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<SaveCredentialsBody>,
) -> Result<Json<Message>, NexusError> {
    state
        .calendar
        .save_credentials(user.id, &body.into_blob())
        .await?;
    Ok(Json(Message::new("Credentials saved")))
}

/// GET /google/events/next-hour -> the caller's primary-calendar events for the next hour.
pub async fn events_next_hour(
    State(state): State<NexusState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<EventsResponse>, NexusError> {
    let events = state.calendar.upcoming_events(user.id).await?;
    Ok(Json(EventsResponse { events }))
}
