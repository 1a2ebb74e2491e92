//! Admin surface — gated static pages plus the listing and deletion API.
//!
//! ANY    /admin, /admin/*              — admin UI (`admin/index.html` or `admin.html`)
//! GET    /api/admin/list?limit=&cursor= — Page through stored files
//! DELETE /api/admin/delete/{id}        — Remove one file record
//!
//! Everything here sits behind [`crate::middleware::admin_gate`]. Unlisted
//! methods on the API paths fall through to static assets ungated.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::HeaderMap,
    middleware,
    routing::{delete, get},
};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tgstash_common::{
    error::StashResult,
    models::FileSummary,
    validation::trailing_segment,
};
use tgstash_db::repository::files;
use tower_http::services::{ServeDir, ServeFile};

use crate::{AppState, forwarded, middleware::admin_gate};

const DEFAULT_PAGE_SIZE: usize = 50;
const MAX_PAGE_SIZE: usize = 200;

/// `/admin` pages: gate first, then hand over to the asset service.
pub fn pages_router(state: Arc<AppState>, assets: ServeDir<ServeFile>) -> Router<Arc<AppState>> {
    Router::new()
        .route_service("/admin", assets.clone())
        .route_service("/admin/", assets.clone())
        .route_service("/admin/{*path}", assets)
        .route_layer(middleware::from_fn_with_state(state, admin_gate))
}

pub fn router(state: Arc<AppState>, assets: ServeDir) -> Router<Arc<AppState>> {
    let gate = middleware::from_fn_with_state(state, admin_gate);

    Router::new()
        .route(
            "/api/admin/list",
            get(list_files)
                .route_layer(gate.clone())
                .fallback_service(assets.clone()),
        )
        .route(
            "/api/admin/delete/",
            delete(delete_unnamed)
                .route_layer(gate.clone())
                .fallback_service(assets.clone()),
        )
        .route(
            "/api/admin/delete/{*path}",
            delete(delete_file)
                .route_layer(gate)
                .fallback_service(assets),
        )
}

// ============================================================
// GET /api/admin/list
// ============================================================

#[derive(Deserialize)]
struct ListQuery {
    limit: Option<String>,
    cursor: Option<String>,
}

#[derive(Serialize)]
struct ListResponse {
    items: Vec<FileSummary>,
    cursor: Option<String>,
    list_complete: bool,
}

/// `limit` as sent, or the default for anything missing, non-numeric or non-positive.
fn page_size(limit: Option<&str>) -> usize {
    limit
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|n| *n > 0)
        .map_or(DEFAULT_PAGE_SIZE, |n| {
            usize::try_from(n).map_or(MAX_PAGE_SIZE, |n| n.min(MAX_PAGE_SIZE))
        })
}

async fn list_files(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> StashResult<Json<ListResponse>> {
    let limit = page_size(query.limit.as_deref());
    let cursor = query.cursor.as_deref().filter(|c| !c.is_empty());

    let page = files::list_page(&state.db.kv, limit, cursor).await?;

    // Lookups run concurrently; join_all keeps the store's key order.
    let records = join_all(
        page.keys
            .iter()
            .map(|key| files::find_by_key(&state.db.kv, key)),
    )
    .await;

    let base = forwarded::base_url(&state.config.server, &headers);
    let items = page
        .keys
        .iter()
        .zip(records)
        .filter_map(|(key, record)| match record {
            Ok(Some(record)) => Some(record.summary(&base)),
            Ok(None) => {
                tracing::debug!(key, "File record vanished while listing");
                None
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "Skipping unreadable file record");
                None
            }
        })
        .collect();

    Ok(Json(ListResponse {
        items,
        cursor: page.cursor,
        list_complete: page.list_complete,
    }))
}

// ============================================================
// DELETE /api/admin/delete/{id}
// ============================================================

#[derive(Serialize)]
struct DeleteResponse {
    ok: bool,
}

async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> StashResult<Json<DeleteResponse>> {
    remove(&state, trailing_segment(&path).unwrap_or_default()).await
}

/// `DELETE /api/admin/delete/` names the empty id.
async fn delete_unnamed(State(state): State<Arc<AppState>>) -> StashResult<Json<DeleteResponse>> {
    remove(&state, "").await
}

/// Drop the metadata record unconditionally. The Telegram copy is left in place.
async fn remove(state: &AppState, id: &str) -> StashResult<Json<DeleteResponse>> {
    files::delete(&state.db.kv, id).await?;
    tracing::info!(id, "File record deleted");
    Ok(Json(DeleteResponse { ok: true }))
}
