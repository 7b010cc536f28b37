use crate::error::NexusError;
use crate::google_oauth::credentials::AuthorizedUser;

use oauth2::{
    Client as OAuth2Client, ClientId, ClientSecret, EmptyExtraTokenFields, EndpointNotSet,
    EndpointSet, RefreshToken, StandardRevocableToken, StandardTokenResponse, TokenUrl,
    basic::{
        BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
        BasicTokenType,
    },
};
use tracing::warn;
use url::Url;

/// Stateless Google OAuth Endpoints.
pub struct GoogleOauthEndpoints;

impl GoogleOauthEndpoints {
    /// Exchange the credential's refresh token for a new access token.
    ///
    /// The credential's own `token_uri` is used when it shares an origin with
    /// `configured_token_uri`; anything else falls back to the configured one.
    pub async fn refresh_access_token(
        creds: &AuthorizedUser,
        configured_token_uri: &Url,
        http_client: &reqwest::Client,
    ) -> Result<GoogleTokenResponse, NexusError> {
        let token_uri = resolve_token_uri(creds, configured_token_uri);
        let client = build_oauth2_client(creds, token_uri);
        let token_result: GoogleTokenResponse = client
            .exchange_refresh_token(&RefreshToken::new(creds.refresh_token.clone()))
            .request_async(http_client)
            .await?;
        Ok(token_result)
    }
}

/// Pick the token endpoint for `creds`, never leaving the configured origin.
fn resolve_token_uri<'a>(creds: &'a AuthorizedUser, configured: &'a Url) -> &'a Url {
    match &creds.token_uri {
        Some(uri) if uri.origin() == configured.origin() => uri,
        Some(uri) => {
            warn!(
                token_uri_host = uri.host_str().unwrap_or_default(),
                "ignoring credential token_uri outside the configured origin"
            );
            configured
        }
        None => configured,
    }
}

/// Build the Google OAuth2 client from credentials.
fn build_oauth2_client(creds: &AuthorizedUser, token_uri: &Url) -> GoogleOauth2Client {
    OAuth2Client::new(ClientId::new(creds.client_id.clone()))
        .set_client_secret(ClientSecret::new(creds.client_secret.clone()))
        .set_token_uri(TokenUrl::from_url(token_uri.clone()))
}

pub type GoogleTokenResponse = StandardTokenResponse<EmptyExtraTokenFields, BasicTokenType>;

type GoogleOauth2Client = OAuth2Client<
    BasicErrorResponse,
    GoogleTokenResponse,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(token_uri: Option<&str>) -> AuthorizedUser {
        let mut blob = serde_json::json!({
            "refresh_token": "1//r",
            "client_id": "c",
            "client_secret": "s"
        });
        if let Some(uri) = token_uri {
            blob["token_uri"] = uri.into();
        }
        AuthorizedUser::from_blob(&blob.to_string()).unwrap()
    }

    #[test]
    fn same_origin_token_uri_is_used() {
        let configured = Url::parse("https://oauth2.googleapis.com/token").unwrap();
        let creds = creds(Some("https://oauth2.googleapis.com/v4/token"));
        assert_eq!(
            resolve_token_uri(&creds, &configured).as_str(),
            "https://oauth2.googleapis.com/v4/token"
        );
    }

    #[test]
    fn foreign_token_uri_falls_back_to_configured() {
        let configured = Url::parse("https://oauth2.googleapis.com/token").unwrap();
        for uri in [
            "http://169.254.169.254/computeMetadata/v1/token",
            "http://oauth2.googleapis.com/token",
            "https://oauth2.googleapis.com:8443/token",
        ] {
            let creds = creds(Some(uri));
            assert_eq!(resolve_token_uri(&creds, &configured), &configured, "{uri}");
        }
    }

    #[test]
    fn missing_token_uri_uses_configured() {
        let configured = Url::parse("https://oauth2.googleapis.com/token").unwrap();
        assert_eq!(resolve_token_uri(&creds(None), &configured), &configured);
    }
}
