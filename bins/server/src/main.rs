//! Eximflow API Server
//!
//! Main entry point for the export-documentation workflow backend.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use eximflow_api::{AppState, create_router};
use eximflow_core::notify::TracingNotifier;
use eximflow_db::connect_with;
use eximflow_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let fmt_layer = if config.log.json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eximflow=debug,tower_http=debug".into()),
        )
        .with(fmt_layer)
        .init();

    let db = connect_with(&config.database)
        .await
        .context("Failed to connect to database")?;
    info!("Connected to database");

    let jwt_service = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        #[allow(clippy::cast_possible_wrap)]
        access_token_expires_minutes: (config.jwt.access_token_expiry_secs / 60) as i64,
    });

    info!(
        numbering_retry_budget = config.workflow.numbering_retry_budget,
        quote_validity_days = config.workflow.quote_validity_days,
        brc_upcoming_window_days = config.workflow.brc_upcoming_window_days,
        "Workflow settings loaded"
    );

    let state = AppState::new(db, jwt_service, config.workflow)
        .with_notifier(Arc::new(TracingNotifier));
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
