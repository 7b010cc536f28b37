use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row of `googlecredentials`.
///
/// `credentials_json` is kept exactly as it was submitted; only the calendar
/// adapter interprets it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GoogleCredential {
    pub id: Uuid,
    pub user_id: Uuid,
    pub credentials_json: String,
    pub expiry: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DbUser {
    pub id: Uuid,
    pub email: String,
    pub is_active: bool,
}
