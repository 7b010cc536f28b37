use crate::error::NexusError;
use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use url::Url;

/// Access tokens this close to expiry are treated as already expired.
const EXPIRY_SKEW_SECS: i64 = 60;

/// Google "authorized user" credential, the JSON shape written by Google's
/// client libraries after an OAuth consent flow.
///
/// Keys this type does not model are kept in `extra` so that writing the
/// credential back does not drop them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizedUser {
    #[serde(default)]
    pub token: Option<String>,
    pub refresh_token: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_uri: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_expiry",
        deserialize_with = "deserialize_expiry"
    )]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AuthorizedUser {
    /// Parse a stored credential blob.
    pub fn from_blob(blob: &str) -> Result<Self, NexusError> {
        serde_json::from_str(blob).map_err(|e| NexusError::InvalidCredentialFormat(e.to_string()))
    }

    pub fn to_blob(&self) -> Result<String, NexusError> {
        Ok(serde_json::to_string(self)?)
    }

    /// True when there is no access token or it expires within the skew window.
    /// A token without a known expiry is assumed valid.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        match (&self.token, self.expiry) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(_), Some(expiry)) => expiry <= now + Duration::seconds(EXPIRY_SKEW_SECS),
        }
    }

    /// Fold a token endpoint response into this credential.
    pub fn apply_refresh(
        &mut self,
        access_token: String,
        expires_in: Option<std::time::Duration>,
        refresh_token: Option<String>,
        now: DateTime<Utc>,
    ) {
        self.token = Some(access_token);
        self.expiry = expires_in
            .and_then(|d| Duration::from_std(d).ok())
            .map(|d| now + d);
        if let Some(rt) = refresh_token {
            self.refresh_token = rt;
        }
    }
}

/// Best-effort read of the `expiry` field of a blob, without requiring the
/// rest of the credential to be well formed.
pub fn peek_expiry(blob: &str) -> Option<DateTime<Utc>> {
    let value: Value = serde_json::from_str(blob).ok()?;
    value.get("expiry")?.as_str().and_then(parse_expiry)
}

/// Accepts RFC 3339 as well as the naive `YYYY-MM-DDTHH:MM:SS[.ffffff]` form
/// (implicitly UTC) that Google's Python library emits.
fn parse_expiry(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn serialize_expiry<S>(expiry: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match expiry {
        Some(dt) => serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Micros, true)),
        None => serializer.serialize_none(),
    }
}

fn deserialize_expiry<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) => parse_expiry(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid expiry timestamp: {s}"))),
    }
}
