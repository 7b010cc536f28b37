use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

pub const GOOGLE_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Runtime configuration, read from `NEXUS_*` environment variables on top of
/// the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen_addr: String,
    pub database_url: String,
    pub loglevel: String,
    /// HS256 key used to verify caller access tokens.
    pub secret_key: String,
    pub api_prefix: String,
    pub proxy: Option<Url>,
    pub calendar_api_base: Url,
    pub google_token_uri: Url,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    /// Write refreshed access tokens back to the credential store.
    pub persist_refreshed_tokens: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            database_url: "sqlite:nexus.db".to_string(),
            loglevel: "info".to_string(),
            secret_key: "changethis".to_string(),
            api_prefix: "/api/v1".to_string(),
            proxy: None,
            calendar_api_base: Url::parse(GOOGLE_CALENDAR_API_BASE)
                .expect("static calendar api url is valid"),
            google_token_uri: Url::parse(GOOGLE_TOKEN_URI).expect("static token uri is valid"),
            connect_timeout_secs: 5,
            request_timeout_secs: 15,
            persist_refreshed_tokens: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed("NEXUS_"))
            .extract()
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_google() {
        let cfg = Config::default();
        assert_eq!(cfg.calendar_api_base.as_str(), GOOGLE_CALENDAR_API_BASE);
        assert_eq!(cfg.google_token_uri.as_str(), GOOGLE_TOKEN_URI);
        assert!(!cfg.persist_refreshed_tokens);
        assert_eq!(cfg.request_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn env_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("NEXUS_DATABASE_URL", "sqlite:other.db");
            jail.set_env("NEXUS_PERSIST_REFRESHED_TOKENS", "true");
            jail.set_env("NEXUS_REQUEST_TIMEOUT_SECS", "30");
            let cfg = Config::from_env()?;
            assert_eq!(cfg.database_url, "sqlite:other.db");
            assert!(cfg.persist_refreshed_tokens);
            assert_eq!(cfg.request_timeout_secs, 30);
            assert_eq!(cfg.api_prefix, "/api/v1");
            Ok(())
        });
    }
}
