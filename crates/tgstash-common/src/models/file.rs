//! Persisted file metadata.

use serde::{Deserialize, Serialize};

/// Metadata for one uploaded file.
///
/// Stored as JSON under `f:{id}`. Field names on the wire are the ones existing
/// deployments already hold in their store; records are never updated, only
/// created and deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Short public identifier, unique across records.
    pub id: String,

    /// Telegram `file_id` returned by `sendDocument`.
    #[serde(rename = "tg_file_id", default)]
    pub external_file_ref: String,

    /// Telegram `file_path` from `getFile`, appended to the file download URL.
    #[serde(rename = "tg_file_path", default)]
    pub external_file_path: String,

    #[serde(default)]
    pub filename: String,

    /// Original content type, possibly empty.
    #[serde(default)]
    pub mime: String,

    /// Size in bytes, 0 if unknown.
    #[serde(default)]
    pub size: u64,

    /// Upload time, epoch milliseconds.
    #[serde(rename = "createdAt", default)]
    pub created_at: i64,

    #[serde(rename = "ip", default)]
    pub source_ip: String,

    #[serde(rename = "ua", default)]
    pub user_agent: String,
}

impl FileRecord {
    /// Whether the record still points at something the hosting API can serve.
    pub fn is_resolvable(&self) -> bool {
        !self.external_file_path.is_empty()
    }

    /// Public listing entry for the admin API.
    pub fn summary(&self, base_url: &str) -> FileSummary {
        FileSummary {
            id: self.id.clone(),
            filename: self.filename.clone(),
            size: self.size,
            mime: self.mime.clone(),
            created_at: self.created_at,
            url: file_url(base_url, &self.id),
        }
    }
}

/// One item of `GET /api/admin/list`.
#[derive(Debug, Clone, Serialize)]
pub struct FileSummary {
    pub id: String,
    pub filename: String,
    pub size: u64,
    pub mime: String,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
    pub url: String,
}

/// Public URL under which a file is served.
pub fn file_url(base_url: &str, id: &str) -> String {
    format!("{base_url}/file/{id}")
}
