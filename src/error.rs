use axum::{Json, http::StatusCode, response::IntoResponse};
use oauth2::basic::BasicErrorResponseType;
use oauth2::reqwest::Error as ReqwestClientError;
use oauth2::{HttpClientError, RequestTokenError, StandardErrorResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum NexusError {
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("Google credentials not found")]
    CredentialNotFound,

    #[error("Stored credentials are malformed: {0}")]
    InvalidCredentialFormat(String),

    #[error("Calendar query failed{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    RemoteQueryFailed {
        status: Option<StatusCode>,
        message: String,
    },

    #[error("Could not validate credentials")]
    Unauthorized,

    #[error("User not found")]
    UserNotFound,

    #[error("Inactive user")]
    InactiveUser,
}

impl NexusError {
    pub fn remote(status: Option<StatusCode>, message: impl Into<String>) -> Self {
        NexusError::RemoteQueryFailed {
            status,
            message: message.into(),
        }
    }
}

impl
    From<
        RequestTokenError<
            HttpClientError<ReqwestClientError>,
            StandardErrorResponse<BasicErrorResponseType>,
        >,
    > for NexusError
{
    fn from(
        e: RequestTokenError<
            HttpClientError<ReqwestClientError>,
            StandardErrorResponse<BasicErrorResponseType>,
        >,
    ) -> Self {
        match e {
            RequestTokenError::ServerResponse(err) => NexusError::remote(
                Some(StatusCode::UNAUTHORIZED),
                format!("token refresh rejected: {}", err.error()),
            ),
            RequestTokenError::Request(req_e) => {
                NexusError::remote(None, format!("token refresh request failed: {}", req_e))
            }
            RequestTokenError::Parse(parse_err, _body) => NexusError::remote(
                None,
                format!("token refresh response unreadable: {}", parse_err),
            ),
            RequestTokenError::Other(s) => NexusError::remote(None, s),
        }
    }
}

impl IntoResponse for NexusError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match &self {
            NexusError::CredentialNotFound => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Google credentials not found".to_string(),
            ),
            NexusError::InvalidCredentialFormat(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_CREDENTIALS",
                "Stored Google credentials could not be parsed.".to_string(),
            ),
            NexusError::RemoteQueryFailed { status, .. } => (
                StatusCode::BAD_GATEWAY,
                "REMOTE_QUERY_FAILED",
                match status {
                    Some(s) => format!("Google Calendar request failed with status {s}."),
                    None => "Google Calendar request failed.".to_string(),
                },
            ),
            NexusError::DatabaseError(_) | NexusError::Json(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal server error occurred.".to_string(),
            ),
            NexusError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Could not validate credentials.".to_string(),
            ),
            NexusError::UserNotFound => (
                StatusCode::NOT_FOUND,
                "USER_NOT_FOUND",
                "User not found.".to_string(),
            ),
            NexusError::InactiveUser => (
                StatusCode::BAD_REQUEST,
                "INACTIVE_USER",
                "Inactive user.".to_string(),
            ),
            NexusError::UrlParse(_) => (
                StatusCode::BAD_GATEWAY,
                "BAD_GATEWAY",
                "Upstream service is unavailable.".to_string(),
            ),
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ApiErrorBody {
            code: code.to_string(),
            message,
        };
        (status, Json(ApiErrorResponse { error: body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
