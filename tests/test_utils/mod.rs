//! Shared fixtures for the router integration tests.
#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response},
};
use calendar_nexus::api::GoogleCalendarApi;
use calendar_nexus::db::{CredentialsStorage, DbUser};
use calendar_nexus::middleware::auth::issue_access_token;
use calendar_nexus::router::{NexusState, nexus_router};
use calendar_nexus::service::CalendarService;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use url::Url;

pub const SECRET: &str = "test-secret";
pub const PREFIX: &str = "/api/v1";

pub struct TestApp {
    pub router: Router,
    pub storage: CredentialsStorage,
    pub user: DbUser,
    pub token: String,
    _dir: TempDir,
}

/// Build the app against a fresh SQLite file, with Google endpoints pointed at
/// `google_base` (normally a mockito server). The token endpoint is
/// `{google_base}/token`.
pub async fn spawn_app(google_base: &str, persist_refreshed_tokens: bool) -> TestApp {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let database_url = format!("sqlite:{}", dir.path().join("nexus.sqlite").display());
    let storage = CredentialsStorage::connect(&database_url)
        .await
        .expect("failed to open test database");

    let base = Url::parse(google_base).expect("invalid google base url");
    let token_uri = base.join("/token").expect("invalid token uri");
    let calendar = CalendarService::new(
        storage.clone(),
        GoogleCalendarApi::new(reqwest::Client::new(), base),
        token_uri,
        persist_refreshed_tokens,
    );
    let router = nexus_router(NexusState::new(calendar, SECRET), PREFIX);

    let user = storage
        .create_user("someone@example.com")
        .await
        .expect("failed to create user");
    let token = bearer_for(&user);

    TestApp {
        router,
        storage,
        user,
        token,
        _dir: dir,
    }
}

pub fn bearer_for(user: &DbUser) -> String {
    issue_access_token(SECRET, user.id, chrono::Duration::minutes(30))
        .expect("failed to sign access token")
}

impl TestApp {
    pub async fn get(&self, path: &str, token: Option<&str>) -> Response<Body> {
        let mut req = Request::builder().method("GET").uri(format!("{PREFIX}{path}"));
        if let Some(token) = token {
            req = req.header("authorization", format!("Bearer {token}"));
        }
        self.router
            .clone()
            .oneshot(req.body(Body::empty()).expect("failed to build request"))
            .await
            .expect("request failed")
    }

    pub async fn post_json(&self, path: &str, token: Option<&str>, body: String) -> Response<Body> {
        let mut req = Request::builder()
            .method("POST")
            .uri(format!("{PREFIX}{path}"))
            .header("content-type", "application/json");
        if let Some(token) = token {
            req = req.header("authorization", format!("Bearer {token}"));
        }
        self.router
            .clone()
            .oneshot(req.body(Body::from(body)).expect("failed to build request"))
            .await
            .expect("request failed")
    }

    pub async fn save_blob(&self, blob: &str) {
        self.storage
            .upsert_credential(self.user.id, blob, None)
            .await
            .expect("failed to seed credential");
    }
}

pub async fn read_json(resp: Response<Body>) -> Value {
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&body).expect("response body was not json")
}
