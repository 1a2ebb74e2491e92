//! Test harness: a fake Telegram Bot API and a router wired to it.

use axum::{
    Json, Router,
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{Request, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tgstash_common::config::{self, AppConfig};
use tgstash_db::Database;
use tower::ServiceExt;

use crate::{AppState, build_router};

pub const BOUNDARY: &str = "tgstash-test-boundary";

// ─── Fake Bot API ────────────────────────────────────────────────────────────

#[derive(Default)]
struct FakeFiles {
    /// file_id → file_path
    paths: HashMap<String, String>,
    /// file_path → bytes
    blobs: HashMap<String, Vec<u8>>,
    /// `Content-Disposition` sent with every download.
    disposition: Option<String>,
    /// `getFile` answers without a `file_path`.
    omit_file_path: bool,
}

#[derive(Clone, Default)]
pub struct FakeTelegram {
    files: Arc<Mutex<FakeFiles>>,
}

impl FakeTelegram {
    pub fn uploads(&self) -> usize {
        self.files.lock().unwrap().blobs.len()
    }

    /// Drop a stored blob so later downloads fail upstream.
    pub fn forget(&self, file_path: &str) {
        self.files.lock().unwrap().blobs.remove(file_path);
    }

    pub fn send_disposition(&self, value: &str) {
        self.files.lock().unwrap().disposition = Some(value.to_owned());
    }

    /// Make `getFile` succeed without a `file_path`.
    pub fn omit_file_path(&self) {
        self.files.lock().unwrap().omit_file_path = true;
    }

    /// Serve the fake on an ephemeral port; returns its base URL.
    pub async fn spawn(&self) -> String {
        let router = Router::new()
            .route("/{bot}/sendDocument", post(send_document))
            .route("/{bot}/getFile", get(get_file))
            .route("/file/{bot}/{*path}", get(download))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }
}

async fn send_document(State(fake): State<FakeTelegram>, mut form: Multipart) -> Json<Value> {
    let mut chat_id = None;
    let mut document = None;
    while let Some(field) = form.next_field().await.unwrap() {
        match field.name() {
            Some("chat_id") => chat_id = Some(field.text().await.unwrap()),
            Some("document") => document = Some(field.bytes().await.unwrap().to_vec()),
            _ => {}
        }
    }
    let (Some(_), Some(bytes)) = (chat_id, document) else {
        return Json(json!({ "ok": false, "description": "Bad Request: missing fields" }));
    };

    let mut files = fake.files.lock().unwrap();
    let n = files.paths.len() + 1;
    let file_id = format!("FILE-{n}");
    let file_path = format!("documents/file_{n}.bin");
    files.paths.insert(file_id.clone(), file_path.clone());
    files.blobs.insert(file_path, bytes);

    Json(json!({ "ok": true, "result": { "message_id": n, "document": { "file_id": file_id } } }))
}

#[derive(Deserialize)]
struct GetFileQuery {
    file_id: String,
}

async fn get_file(State(fake): State<FakeTelegram>, Query(q): Query<GetFileQuery>) -> Response {
    let files = fake.files.lock().unwrap();
    match files.paths.get(&q.file_id) {
        Some(_) if files.omit_file_path => Json(json!({ "ok": true, "result": {} })).into_response(),
        Some(path) => Json(json!({ "ok": true, "result": { "file_path": path } })).into_response(),
        None => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "description": "Bad Request: invalid file_id" })),
        )
            .into_response(),
    }
}

async fn download(
    State(fake): State<FakeTelegram>,
    Path((_bot, path)): Path<(String, String)>,
) -> Response {
    let files = fake.files.lock().unwrap();
    let Some(bytes) = files.blobs.get(&path) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let mut response = (
        [
            (header::CONTENT_TYPE, "application/octet-stream"),
            (header::CONNECTION, "keep-alive"),
        ],
        bytes.clone(),
    )
        .into_response();
    if let Some(disposition) = &files.disposition {
        response
            .headers_mut()
            .insert(header::CONTENT_DISPOSITION, disposition.parse().unwrap());
    }
    response
}

// ─── App under test ──────────────────────────────────────────────────────────

/// Throwaway static asset directory, removed on drop.
pub struct AssetsDir(PathBuf);

impl AssetsDir {
    /// Directory holding `(relative path, content)` files.
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        let dir = std::env::temp_dir().join(format!(
            "tgstash-assets-{}",
            tgstash_common::short_id::generate()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        for (name, content) in files {
            let path = dir.join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(path, content).unwrap();
        }
        Self(dir)
    }

    /// Front page plus an `admin/index.html` admin page.
    fn create() -> Self {
        Self::with_files(&[("index.html", "front page"), ("admin/index.html", "admin page")])
    }

    pub fn path(&self) -> String {
        self.0.to_string_lossy().into_owned()
    }
}

impl Drop for AssetsDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

pub struct TestApp {
    pub router: Router,
    pub db: Database,
    pub telegram: FakeTelegram,
    _assets: AssetsDir,
}

impl TestApp {
    /// App configured from flat deployment variables, pointed at a fresh fake Bot API.
    pub async fn with_env(vars: &[(&str, &str)]) -> Self {
        Self::build(vars, |_| {}).await
    }

    /// Like [`TestApp::with_env`], with a final chance to adjust the config.
    pub async fn build(vars: &[(&str, &str)], tweak: impl FnOnce(&mut AppConfig)) -> Self {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut cfg = config::build(|name| vars.get(name).cloned()).unwrap();

        let telegram = FakeTelegram::default();
        let assets = AssetsDir::create();
        cfg.telegram.api_base = telegram.spawn().await;
        cfg.telegram.timeout_secs = 5;
        cfg.server.assets_dir = assets.path();
        tweak(&mut cfg);

        let db = Database::in_memory();
        let state = AppState::new(cfg, db.clone()).unwrap();

        Self {
            router: build_router(state),
            db,
            telegram,
            _assets: assets,
        }
    }

    /// Upload-ready app with the bot configured and the admin gate open.
    pub async fn new() -> Self {
        Self::with_env(&[("TG_BOT_TOKEN", "123:abc"), ("TG_CHAT_ID", "-100")]).await
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

// ─── Request and response helpers ────────────────────────────────────────────

/// One multipart part: field name, optional filename, content.
pub struct Part<'a> {
    pub name: &'a str,
    pub filename: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub bytes: &'a [u8],
}

impl<'a> Part<'a> {
    pub fn file(name: &'a str, filename: &'a str, bytes: &'a [u8]) -> Self {
        Self {
            name,
            filename: Some(filename),
            content_type: Some("text/plain"),
            bytes,
        }
    }

    pub fn text(name: &'a str, value: &'a str) -> Self {
        Self {
            name,
            filename: None,
            content_type: None,
            bytes: value.as_bytes(),
        }
    }
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", part.name);
        if let Some(filename) = part.filename {
            disposition.push_str(&format!("; filename=\"{filename}\""));
        }
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(b"\r\n");
        if let Some(ct) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {ct}\r\n").as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn upload_request(path: &str, parts: &[Part<'_>]) -> Request<Body> {
    Request::post(path)
        .header(header::HOST, "host")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

pub fn get_request(path: &str) -> Request<Body> {
    Request::get(path)
        .header(header::HOST, "host")
        .body(Body::empty())
        .unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
