use calendar_nexus::api::GoogleCalendarApi;
use calendar_nexus::config::Config;
use calendar_nexus::db::CredentialsStorage;
use calendar_nexus::router::{NexusState, nexus_router};
use calendar_nexus::service::CalendarService;
use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::from_env()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.database_url,
        proxy = %cfg.proxy.as_ref().map(|u| u.as_str()).unwrap_or("<none>"),
        loglevel = %cfg.loglevel,
        calendar_api_base = %cfg.calendar_api_base,
        persist_refreshed_tokens = cfg.persist_refreshed_tokens,
    );
    if cfg.secret_key == Config::default().secret_key {
        warn!("NEXUS_SECRET_KEY is unset; using the insecure default");
    }

    let storage = CredentialsStorage::connect(&cfg.database_url).await?;
    let http_client = build_http_client(&cfg)?;
    let calendar = CalendarService::new(
        storage,
        GoogleCalendarApi::new(http_client, cfg.calendar_api_base.clone()),
        cfg.google_token_uri.clone(),
        cfg.persist_refreshed_tokens,
    );

    let state = NexusState::new(calendar, cfg.secret_key.as_str());
    let app = nexus_router(state, &cfg.api_prefix);

    let listener = TcpListener::bind(cfg.listen_addr.as_str()).await?;
    info!("HTTP server listening on {}", cfg.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// One outbound client for both the Calendar API and token refreshes.
fn build_http_client(cfg: &Config) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder()
        .user_agent(concat!("calendar-nexus/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(cfg.connect_timeout())
        .timeout(cfg.request_timeout())
        // token endpoints must not be followed across redirects
        .redirect(reqwest::redirect::Policy::none());
    if let Some(proxy_url) = cfg.proxy.as_ref() {
        builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
    }
    builder.build()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
