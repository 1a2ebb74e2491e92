//! # tgstash-api
//!
//! HTTP layer for tgstash. Anonymous upload and file-serving endpoints, the
//! Basic-Auth-gated admin API, and a static asset passthrough for everything else.
//!
//! Route table, first match wins:
//!
//! | path | methods | handler |
//! |---|---|---|
//! | `/admin`, `/admin/*` | any | admin gate, then static assets |
//! | `/upload`, `/api/upload` | POST | [`routes::uploads`] |
//! | `/file/{id}` | GET | [`routes::files`] |
//! | `/api/admin/list` | GET | [`routes::admin`] (gated) |
//! | `/api/admin/delete/{id}` | DELETE | [`routes::admin`] (gated) |
//! | `/api/ping` | any | [`routes::health`] |
//! | anything else | any | static assets |

pub mod auth;
pub mod forwarded;
pub mod middleware;
pub mod routes;

#[cfg(test)]
mod testing;

use axum::Router;
use std::sync::Arc;
use tgstash_common::config::AppConfig;
use tgstash_db::{Database, telegram::TelegramClient};

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    /// Telegram Bot API client holding the file bytes.
    pub telegram: TelegramClient,
    /// Configuration loaded at startup; handlers never read the environment.
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig, db: Database) -> anyhow::Result<Self> {
        let telegram = TelegramClient::new(&config.telegram)?;
        Ok(Self {
            db,
            telegram,
            config: Arc::new(config),
        })
    }
}

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let state = Arc::new(state);
    let assets = routes::assets::service(&state.config.server.assets_dir);

    Router::new()
        .merge(routes::admin::pages_router(
            state.clone(),
            routes::assets::admin_service(&state.config.server.assets_dir),
        ))
        .merge(routes::uploads::router(&state.config.limits, assets.clone()))
        .merge(routes::files::router(assets.clone()))
        .merge(routes::admin::router(state.clone(), assets.clone()))
        .merge(routes::health::router())
        .fallback_service(assets)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
