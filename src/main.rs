use std::fs;
use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use salonbook::config::AppConfig;
use salonbook::db::{self, SqliteDirectory};
use salonbook::handlers;
use salonbook::models::BusinessProfile;
use salonbook::services::engine::BookingEngine;
use salonbook::services::messaging::line::{LineIdentityResolver, LineMessagingProvider};
use salonbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;
    let db = Arc::new(Mutex::new(conn));

    let profile = if config.profile_path.is_empty() {
        tracing::info!("using built-in business profile");
        BusinessProfile::default()
    } else {
        tracing::info!("loading business profile from {}", config.profile_path);
        let json = fs::read_to_string(&config.profile_path)?;
        BusinessProfile::from_json(&json)?
    };

    if config.line_channel_access_token.is_empty() {
        tracing::warn!("LINE_CHANNEL_ACCESS_TOKEN not set, outbound messages will fail");
    }

    let directory = Arc::new(SqliteDirectory::new(db.clone()));
    let identity = Arc::new(LineIdentityResolver::new(
        config.line_channel_access_token.clone(),
    ));
    let messaging = LineMessagingProvider::new(config.line_channel_access_token.clone());

    let engine = BookingEngine::new(profile.clone(), directory, identity);

    let state = Arc::new(AppState {
        db,
        config: config.clone(),
        profile,
        engine,
        messaging: Box::new(messaging),
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/webhook/line", post(handlers::webhook::line_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
