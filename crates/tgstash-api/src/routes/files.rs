//! File proxy — streams stored files back from Telegram.
//!
//! `GET /file/{id}` resolves the record, fetches the bytes from the Bot API and
//! streams them through with long-lived cache headers. Only the last path
//! segment is used as the id.

use axum::{
    Router,
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, HeaderName, HeaderValue, header},
    response::Response,
    routing::get,
};
use std::sync::Arc;
use tgstash_common::{
    error::{StashError, StashResult},
    models::FileRecord,
    validation::{inline_disposition, trailing_segment},
};
use tgstash_db::{StoreError, repository::files};
use tower_http::services::ServeDir;

use crate::AppState;

const IMMUTABLE: &str = "public, max-age=31536000, immutable";

/// Connection-scoped headers that must not be forwarded.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

pub fn router(assets: ServeDir) -> Router<Arc<AppState>> {
    Router::new()
        .route("/file/", get(missing_id).fallback_service(assets.clone()))
        .route("/file/{*path}", get(serve_file).fallback_service(assets))
}

async fn missing_id() -> StashError {
    StashError::validation("missing id")
}

async fn serve_file(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> StashResult<Response> {
    let id = trailing_segment(&path).ok_or_else(|| StashError::validation("missing id"))?;
    let record = resolve(&state, id).await?;

    let upstream = state
        .telegram
        .fetch_file(&record.external_file_path)
        .await
        .map_err(|e| {
            tracing::warn!(id, error = %e, "Telegram download failed");
            StashError::BadGateway
        })?;

    let mut headers = forwardable_headers(upstream.headers());
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(IMMUTABLE));
    if !headers.contains_key(header::CONTENT_DISPOSITION) {
        if let Ok(value) = HeaderValue::from_str(&inline_disposition(&record.filename, id)) {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
    }

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.headers_mut() = headers;
    Ok(response)
}

/// Look up a record that can still be served.
async fn resolve(state: &AppState, id: &str) -> StashResult<FileRecord> {
    match files::find_by_id(&state.db.kv, id).await {
        Ok(Some(record)) if record.is_resolvable() => Ok(record),
        Ok(_) => Err(StashError::NotFound),
        Err(StoreError::Serialisation(e)) => {
            tracing::warn!(id, error = %e, "Unreadable file record");
            Err(StashError::NotFound)
        }
        Err(e) => Err(e.into()),
    }
}

fn forwardable_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream {
        if !is_hop_by_hop(name) {
            headers.append(name.clone(), value.clone());
        }
    }
    headers
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Part, TestApp, body_bytes, body_json, get_request, upload_request};
    use axum::http::StatusCode;

    async fn upload(app: &TestApp, filename: &str, bytes: &[u8]) -> String {
        let resp = app
            .send(upload_request("/upload", &[Part::file("file", filename, bytes)]))
            .await;
        body_json(resp).await["id"].as_str().unwrap().to_owned()
    }

    #[tokio::test]
    async fn unknown_id_is_404() {
        let app = TestApp::new().await;
        let resp = app.send(get_request("/file/doesnotexist1234")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_bytes(resp).await, b"Not Found");
    }

    #[tokio::test]
    async fn empty_id_is_400() {
        let app = TestApp::new().await;
        let resp = app.send(get_request("/file/")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"], "missing id");
    }

    #[tokio::test]
    async fn serves_with_cache_headers() {
        let app = TestApp::new().await;
        let id = upload(&app, "my photo (1).png", b"pixels").await;

        let resp = app.send(get_request(&format!("/file/{id}"))).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CACHE_CONTROL], IMMUTABLE);
        assert_eq!(
            resp.headers()[header::CONTENT_DISPOSITION],
            "inline; filename=\"my_photo__1_.png\""
        );
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/octet-stream");
        assert!(!resp.headers().contains_key(header::CONNECTION));
        assert_eq!(body_bytes(resp).await, b"pixels");
    }

    #[tokio::test]
    async fn last_segment_is_the_id() {
        let app = TestApp::new().await;
        let id = upload(&app, "a.txt", b"abc").await;
        let resp = app.send(get_request(&format!("/file/anything/{id}"))).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn upstream_failure_is_502() {
        let app = TestApp::new().await;
        let id = upload(&app, "a.txt", b"abc").await;
        let record = files::find_by_id(&app.db.kv, &id).await.unwrap().unwrap();
        app.telegram.forget(&record.external_file_path);

        let resp = app.send(get_request(&format!("/file/{id}"))).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_bytes(resp).await, b"Upstream Error");
    }

    #[tokio::test]
    async fn unresolvable_or_corrupt_records_are_404() {
        let app = TestApp::new().await;
        app.db
            .kv
            .put(&files::key_for("nopath"), r#"{"id":"nopath","tg_file_id":"x"}"#)
            .await
            .unwrap();
        app.db.kv.put(&files::key_for("corrupt"), "{").await.unwrap();

        assert_eq!(app.send(get_request("/file/nopath")).await.status(), StatusCode::NOT_FOUND);
        assert_eq!(app.send(get_request("/file/corrupt")).await.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn strips_hop_by_hop_headers() {
        let mut upstream = HeaderMap::new();
        upstream.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        upstream.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        upstream.insert(header::ETAG, HeaderValue::from_static("\"v1\""));

        let headers = forwardable_headers(&upstream);
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[header::ETAG], "\"v1\"");
    }

    #[tokio::test]
    async fn upstream_disposition_is_kept() {
        let app = TestApp::new().await;
        let id = upload(&app, "a.txt", b"abc").await;
        app.telegram.send_disposition("attachment; filename=\"orig.txt\"");

        let resp = app.send(get_request(&format!("/file/{id}"))).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"orig.txt\""
        );
        assert_eq!(resp.headers()[header::CACHE_CONTROL], IMMUTABLE);
    }

    #[tokio::test]
    async fn slow_reader_gets_whole_body() {
        let app = TestApp::build(
            &[("TG_BOT_TOKEN", "123:abc"), ("TG_CHAT_ID", "-100")],
            |cfg| cfg.telegram.timeout_secs = 1,
        )
        .await;
        let id = upload(&app, "a.txt", b"0123456789").await;

        let resp = app.send(get_request(&format!("/file/{id}"))).await;
        assert_eq!(resp.status(), StatusCode::OK);
        tokio::time::sleep(std::time::Duration::from_millis(1500)).await;
        assert_eq!(body_bytes(resp).await, b"0123456789");
    }
}
