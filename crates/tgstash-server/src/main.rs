//! # tgstash server
//!
//! Single binary serving the whole HTTP surface:
//! - anonymous uploads and file proxy (bytes live on Telegram)
//! - Basic-Auth admin UI and API
//! - static assets for everything else
//!
//! Metadata goes to Redis when `REDIS_URL` is set, otherwise it is kept in process.

use std::net::SocketAddr;
use tgstash_api::{AppState, build_router};
use tgstash_db::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = tgstash_common::config::load()?;

    // Initialize tracing (structured logging)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tgstash=debug,tower_http=debug".into()),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    tracing::info!("Starting tgstash v{}", env!("CARGO_PKG_VERSION"));
    if config.telegram.credentials().is_none() {
        tracing::warn!("TG_BOT_TOKEN / TG_CHAT_ID not set; uploads and downloads will fail");
    }
    if config.admin.credentials().is_none() {
        tracing::warn!("BASIC_USER / BASIC_PASS not set; admin endpoints are open");
    }
    tracing::info!(assets = %config.server.assets_dir, "Serving static assets");

    let db = Database::connect(&config).await?;

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    let state = AppState::new(config, db)?;
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP listening on http://{addr}");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Shut down cleanly");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
