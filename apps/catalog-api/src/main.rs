//! # Catalog API Server
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ApiConfig (env) ──► PartnerConfig (TOML + env)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new (migrations) ──► TokenStore::load (token file)          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  TokenRefresher::spawn ──► axum::serve (until Ctrl+C / SIGTERM)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use anyhow::Context;
use catalog_api::config::ApiConfig;
use catalog_api::{router, AppState};
use catalog_db::{Database, DbConfig};
use catalog_sync::{
    HttpPartnerApi, PartnerApi, PartnerConfig, RefreshSettings, TokenRefresher, TokenStore,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    info!("Starting catalog API server...");

    let config = ApiConfig::load()?;
    let partner_config = PartnerConfig::load(config.partner_config_path.clone())
        .context("Failed to load partner configuration")?;
    info!(
        addr = %config.socket_addr(),
        partner = %partner_config.partner.base_url,
        policy = %partner_config.sync.upstream_policy,
        "Configuration loaded"
    );

    let db = Database::new(
        DbConfig::from_url(&config.database_url).max_connections(config.db_max_connections),
    )
    .await
    .context("Failed to open database")?;

    let partner: Arc<dyn PartnerApi> = Arc::new(HttpPartnerApi::from_config(&partner_config)?);

    let store = TokenStore::load(partner_config.token.file.clone());
    let tokens = store.reader();
    let refresher = TokenRefresher::new(
        partner.clone(),
        store,
        partner_config.partner.refresh_token.clone(),
        RefreshSettings::from_config(&partner_config),
    )
    .spawn();

    let state = AppState::new(
        db.clone(),
        partner,
        tokens,
        partner_config.sync.upstream_policy,
    )
    .with_refresher(refresher);

    let listener = tokio::net::TcpListener::bind(config.socket_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.socket_addr()))?;
    info!(addr = %config.socket_addr(), "Listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
