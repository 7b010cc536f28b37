use axum::RequestPartsExt;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use chrono::{Duration, Utc};
use headers::{Authorization, authorization::Bearer};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::db::DbUser;
use crate::error::NexusError;
use crate::router::NexusState;

/// Access token claims: `sub` is the user's id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
}

/// Sign an HS256 access token for `user_id`, valid for `ttl`.
pub fn issue_access_token(
    secret: &str,
    user_id: Uuid,
    ttl: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (Utc::now() + ttl).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Verify an access token and return the user id it was issued for.
pub fn verify_access_token(secret: &str, token: &str) -> Result<Uuid, NexusError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        debug!(error = %e, "rejected access token");
        NexusError::Unauthorized
    })?;
    Uuid::parse_str(&data.claims.sub).map_err(|_| NexusError::Unauthorized)
}

/// The authenticated, active caller.
///
/// Requires `Authorization: Bearer <token>`; the token's subject must name
/// an existing user.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub DbUser);

impl FromRequestParts<NexusState> for CurrentUser {
    type Rejection = NexusError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &NexusState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| NexusError::Unauthorized)?;

        let user_id = verify_access_token(&state.secret_key, bearer.token())?;
        let user = state
            .calendar
            .storage()
            .get_user(user_id)
            .await?
            .ok_or(NexusError::UserNotFound)?;
        if !user.is_active {
            return Err(NexusError::InactiveUser);
        }
        Ok(Self(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies() {
        let user_id = Uuid::new_v4();
        let token = issue_access_token("secret", user_id, Duration::minutes(5)).unwrap();
        assert_eq!(verify_access_token("secret", &token).unwrap(), user_id);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_access_token("secret", Uuid::new_v4(), Duration::minutes(5)).unwrap();
        assert!(matches!(
            verify_access_token("other", &token),
            Err(NexusError::Unauthorized)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = issue_access_token("secret", Uuid::new_v4(), Duration::hours(-1)).unwrap();
        assert!(matches!(
            verify_access_token("secret", &token),
            Err(NexusError::Unauthorized)
        ));
    }
}
