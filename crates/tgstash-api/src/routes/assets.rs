//! Static asset passthrough (admin UI, front page, anything unrouted).

use std::path::Path;
use tower_http::services::{ServeDir, ServeFile};

/// Service serving `dir`; directories resolve to their `index.html`.
pub fn service(dir: &str) -> ServeDir {
    ServeDir::new(dir).append_index_html_on_directories(true)
}

/// Like [`service`], answering with `admin.html` when nothing else matches.
pub fn admin_service(dir: &str) -> ServeDir<ServeFile> {
    service(dir).fallback(ServeFile::new(Path::new(dir).join("admin.html")))
}
