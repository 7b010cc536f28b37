use serde::{Deserialize, Serialize};

/// Generic `{"message": "..."}` acknowledgement body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Body of `POST /google/credentials`.
///
/// Accepts `{"credentials_json": "..."}` as well as a bare JSON string, which
/// is what browser clients tend to send.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SaveCredentialsBody {
    Wrapped { credentials_json: String },
    Raw(String),
}

impl SaveCredentialsBody {
    pub fn into_blob(self) -> String {
        match self {
            Self::Wrapped { credentials_json } | Self::Raw(credentials_json) => credentials_json,
        }
    }
}
