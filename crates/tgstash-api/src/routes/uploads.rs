//! Anonymous uploads — multipart form to Telegram, metadata to the store.
//!
//! POST /upload       — Upload a file (multipart/form-data)
//! POST /api/upload   — Same, kept for older front-ends
//!
//! Any other method on these paths falls through to static assets.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State, connect_info::ConnectInfo},
    extract::multipart::{Field, MultipartError},
    handler::Handler,
    http::{StatusCode, header},
    routing::post,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tgstash_common::{
    config::LimitsConfig,
    error::{StashError, StashResult},
    models::{FileRecord, FormPart, UploadedFile, file_url},
    short_id,
};
use tgstash_db::repository::files;
use tower_http::services::ServeDir;

use crate::{AppState, forwarded};

/// Accepted form fields for the file, highest priority first.
const FILE_FIELDS: [&str; 3] = ["file", "image", "photo"];

/// Room for multipart framing and small text fields on top of the file limit.
const FORM_OVERHEAD_BYTES: u64 = 1024 * 1024;

/// Attempts at drawing an id not already in the store.
const ID_ATTEMPTS: usize = 3;

pub fn router(limits: &LimitsConfig, assets: ServeDir) -> Router<Arc<AppState>> {
    let body_limit = usize::try_from(limits.max_upload_bytes.saturating_add(FORM_OVERHEAD_BYTES))
        .unwrap_or(usize::MAX);
    let upload = || {
        post(upload_file.layer(DefaultBodyLimit::max(body_limit))).fallback_service(assets.clone())
    };

    Router::new()
        .route("/upload", upload())
        .route("/api/upload", upload())
}

// ============================================================
// Response types
// ============================================================

#[derive(Serialize)]
struct UploadResponse {
    id: String,
    /// Public URL the file is served from.
    src: String,
}

// ============================================================
// POST /upload
// ============================================================

/// Upload one file.
///
/// The file is taken from the first of `file`, `image`, `photo` that was sent.
/// It is stored on Telegram first; the metadata record is written only once
/// Telegram has accepted it.
async fn upload_file(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> StashResult<Json<UploadResponse>> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("multipart/form-data"));
    if !is_multipart {
        return Err(StashError::validation("expect multipart/form-data"));
    }

    let headers = request.headers().clone();
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let max = state.config.limits.max_upload_bytes;
    let multipart = Multipart::from_request(request, &state)
        .await
        .map_err(|e| StashError::validation(e.body_text()))?;
    let file = extract_file(multipart, max).await?;

    let filename = file.display_name().to_owned();
    let mime = file.mime().to_owned();
    let size = file.size();

    let stored = state.telegram.upload_document(file.bytes, &filename).await?;

    let id = allocate_id(&state).await?;
    let record = FileRecord {
        id: id.clone(),
        external_file_ref: stored.file_id,
        external_file_path: stored.file_path,
        filename,
        mime,
        size,
        created_at: chrono::Utc::now().timestamp_millis(),
        source_ip: forwarded::client_ip(&headers, peer),
        user_agent: forwarded::user_agent(&headers),
    };

    if let Err(e) = files::create(&state.db.kv, &record).await {
        tracing::error!(
            id = %record.id,
            file_id = %record.external_file_ref,
            error = %e,
            "Failed to persist file record; Telegram copy is orphaned"
        );
        return Err(e.into());
    }

    tracing::info!(id = %record.id, size, filename = %record.filename, "File uploaded");

    let base = forwarded::base_url(&state.config.server, &headers);
    Ok(Json(UploadResponse {
        src: file_url(&base, &id),
        id,
    }))
}

// ============================================================
// Form parsing
// ============================================================

/// Pull the winning file part out of the form.
async fn extract_file(mut multipart: Multipart, max: u64) -> StashResult<UploadedFile> {
    let mut slots: [Option<FormPart>; 3] = Default::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max))?
    {
        let Some(slot) = field
            .name()
            .and_then(|name| FILE_FIELDS.iter().position(|f| *f == name))
        else {
            continue;
        };
        // Repeated field names keep the first value that was actually sent.
        if slots[slot].as_ref().is_some_and(FormPart::is_present) {
            continue;
        }
        slots[slot] = Some(read_part(field, max).await?);
    }

    match slots.into_iter().flatten().find(FormPart::is_present) {
        Some(FormPart::File(file)) if file.size() <= max => Ok(file),
        Some(FormPart::File(_)) | Some(FormPart::Oversized) => Err(too_large(max)),
        _ => Err(StashError::validation(
            "no file found in form field 'file'/'image'/'photo'",
        )),
    }
}

/// Read one candidate part, giving up on the content once it passes `max`.
async fn read_part(mut field: Field<'_>, max: u64) -> StashResult<FormPart> {
    let Some(filename) = field.file_name().map(str::to_owned) else {
        let text = field.text().await.map_err(|e| multipart_error(e, max))?;
        return Ok(FormPart::Text(text));
    };
    let content_type = field.content_type().map(str::to_owned);

    let mut bytes = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(e, max))? {
        if (bytes.len() + chunk.len()) as u64 > max {
            tracing::debug!(filename, max, "Upload part exceeds limit, discarding");
            return Ok(FormPart::Oversized);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(FormPart::File(UploadedFile {
        filename: Some(filename),
        content_type,
        bytes,
    }))
}

fn too_large(max: u64) -> StashError {
    StashError::PayloadTooLarge {
        message: format!("file too large (>{}MB)", max / (1024 * 1024)),
    }
}

fn multipart_error(e: MultipartError, max: u64) -> StashError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        too_large(max)
    } else {
        StashError::validation(e.body_text())
    }
}

/// Draw a short id that is not yet in use.
async fn allocate_id(state: &AppState) -> StashResult<String> {
    for _ in 0..ID_ATTEMPTS {
        let id = short_id::generate();
        if !files::exists(&state.db.kv, &id).await? {
            return Ok(id);
        }
        tracing::warn!(id, "Generated file id already taken, retrying");
    }
    Err(anyhow::anyhow!("could not allocate a unique file id").into())
}
