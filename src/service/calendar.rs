use crate::api::GoogleCalendarApi;
use crate::db::{CredentialsStorage, GoogleCredential};
use crate::error::NexusError;
use crate::google_oauth::credentials::{AuthorizedUser, peek_expiry};
use crate::google_oauth::endpoints::GoogleOauthEndpoints;
use crate::types::calendar::{EventItem, EventWindow};
use chrono::{DateTime, Utc};
use oauth2::TokenResponse;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

const PRIMARY_CALENDAR: &str = "primary";

/// Ties the credential store to the Google Calendar API.
#[derive(Clone)]
pub struct CalendarService {
    storage: CredentialsStorage,
    api: GoogleCalendarApi,
    token_uri: Url,
    persist_refreshed_tokens: bool,
}

impl CalendarService {
    pub fn new(
        storage: CredentialsStorage,
        api: GoogleCalendarApi,
        token_uri: Url,
        persist_refreshed_tokens: bool,
    ) -> Self {
        Self {
            storage,
            api,
            token_uri,
            persist_refreshed_tokens,
        }
    }

    pub fn storage(&self) -> &CredentialsStorage {
        &self.storage
    }

    /// Store `credentials_json` for `user_id` exactly as given. The blob is
    /// not validated here; only its `expiry` is read, when present.
    pub async fn save_credentials(
        &self,
        user_id: Uuid,
        credentials_json: &str,
    ) -> Result<GoogleCredential, NexusError> {
        let expiry = peek_expiry(credentials_json);
        let saved = self
            .storage
            .upsert_credential(user_id, credentials_json, expiry)
            .await?;
        info!(user_id = %user_id, credential_id = %saved.id, "google credentials saved");
        Ok(saved)
    }

    /// Events on the user's primary calendar starting within the next hour.
    pub async fn upcoming_events(&self, user_id: Uuid) -> Result<Vec<EventItem>, NexusError> {
        let now = Utc::now();
        self.events_in_window(user_id, EventWindow::next_hour(now), now)
            .await
    }

    pub async fn events_in_window(
        &self,
        user_id: Uuid,
        window: EventWindow,
        now: DateTime<Utc>,
    ) -> Result<Vec<EventItem>, NexusError> {
        let stored = self
            .storage
            .get_credential(user_id)
            .await?
            .ok_or(NexusError::CredentialNotFound)?;

        let mut creds = AuthorizedUser::from_blob(&stored.credentials_json).inspect_err(|e| {
            warn!(user_id = %user_id, error = %e, "stored google credentials are malformed");
        })?;

        if creds.needs_refresh(now) {
            self.refresh(user_id, &stored.credentials_json, &mut creds, now)
                .await?;
        }

        let access_token = creds
            .token
            .as_deref()
            .ok_or_else(|| NexusError::remote(None, "no access token after refresh"))?;
        self.api
            .list_events(access_token, PRIMARY_CALENDAR, &window)
            .await
    }

    async fn refresh(
        &self,
        user_id: Uuid,
        stored_json: &str,
        creds: &mut AuthorizedUser,
        now: DateTime<Utc>,
    ) -> Result<(), NexusError> {
        let resp =
            GoogleOauthEndpoints::refresh_access_token(creds, &self.token_uri, self.api.client())
                .await
                .inspect_err(|e| {
                    warn!(user_id = %user_id, error = %e, "google access token refresh failed");
                })?;
        creds.apply_refresh(
            resp.access_token().secret().clone(),
            resp.expires_in(),
            resp.refresh_token().map(|t| t.secret().clone()),
            now,
        );
        info!(user_id = %user_id, "google access token refreshed");

        if self.persist_refreshed_tokens {
            // Only write back over the blob the refresh started from; a save
            // that landed meanwhile wins.
            let blob = creds.to_blob()?;
            let applied = self
                .storage
                .update_credential_if_unchanged(user_id, stored_json, &blob, creds.expiry)
                .await?;
            if !applied {
                debug!(user_id = %user_id, "credentials changed during refresh, keeping stored value");
            }
        }
        Ok(())
    }
}
