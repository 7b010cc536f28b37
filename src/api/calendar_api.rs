use crate::error::NexusError;
use crate::types::calendar::{EventItem, EventWindow};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

/// Thin client for the Google Calendar v3 `events.list` endpoint.
#[derive(Clone)]
pub struct GoogleCalendarApi {
    client: reqwest::Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct EventListResponse {
    #[serde(default)]
    items: Vec<EventItem>,
}

impl GoogleCalendarApi {
    pub fn new(client: reqwest::Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// List single (recurrence-expanded) events of `calendar_id` inside
    /// `window`, ordered by start time. Only the first result page is read.
    pub async fn list_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        window: &EventWindow,
    ) -> Result<Vec<EventItem>, NexusError> {
        let url = self.events_url(calendar_id)?;

        let resp = self
            .client
            .get(url)
            .bearer_auth(access_token)
            .header("Accept", "application/json")
            .query(&[
                ("timeMin", window.time_min()),
                ("timeMax", window.time_max()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ])
            .send()
            .await
            .map_err(|e| NexusError::remote(None, format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = google_error_message(&body).unwrap_or(body);
            warn!(%status, calendar_id, "calendar events request rejected");
            return Err(NexusError::remote(Some(status), message));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| NexusError::remote(Some(status), format!("failed to read body: {e}")))?;
        let list: EventListResponse = serde_json::from_slice(&body).map_err(|e| {
            NexusError::remote(Some(status), format!("failed to parse events response: {e}"))
        })?;

        debug!(count = list.items.len(), calendar_id, "fetched calendar events");
        Ok(list.items)
    }

    fn events_url(&self, calendar_id: &str) -> Result<Url, NexusError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| NexusError::UrlParse(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(["calendars", calendar_id, "events"]);
        Ok(url)
    }
}

/// Pull `error.message` out of a Google API error body.
fn google_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}
