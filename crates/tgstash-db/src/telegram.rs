//! Telegram Bot API client used as durable file storage.
//!
//! Uploads go through `sendDocument` into a configured chat, which keeps the
//! original bytes and filename (`sendPhoto` would recompress). The returned
//! `file_id` is resolved once with `getFile` into a `file_path` that can be
//! downloaded again for as long as the message exists.

use reqwest::{Client, Response, multipart};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tgstash_common::config::{TelegramConfig, is_truthy};
use tgstash_common::error::StashError;

/// Errors from the Bot API round trips.
#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Server not configured: TG_BOT_TOKEN / TG_CHAT_ID")]
    NotConfigured,

    #[error("Telegram request failed: {0}")]
    Http(reqwest::Error),

    /// `ok: false` or a non-2xx status; carries Telegram's own description when it sent one.
    #[error("{0}")]
    Api(String),

    #[error("No file_id from Telegram")]
    MissingFileId,

    #[error("No file_path from Telegram")]
    MissingFilePath,

    #[error("Telegram file download failed: {0}")]
    Status(u16),
}

impl From<reqwest::Error> for TelegramError {
    fn from(e: reqwest::Error) -> Self {
        // Request URLs embed the bot token.
        TelegramError::Http(e.without_url())
    }
}

impl From<TelegramError> for StashError {
    fn from(e: TelegramError) -> Self {
        StashError::Upstream(e.to_string())
    }
}

/// Where a document ended up on Telegram's side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub file_id: String,
    pub file_path: String,
}

// ─── Bot API payloads ────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ApiResponse<T> {
    #[serde(default)]
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct SentMessage {
    document: Option<Document>,
}

#[derive(Deserialize)]
struct Document {
    file_id: Option<String>,
    file_unique_id: Option<String>,
}

#[derive(Deserialize)]
struct FileInfo {
    file_path: Option<String>,
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Async client for the handful of Bot API methods tgstash needs.
#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    /// Deadline for Bot API method calls. Downloads are bounded in the connect phase only.
    call_timeout: Duration,
    api_base: String,
    bot_token: Option<String>,
    chat_id: Option<String>,
}

impl TelegramClient {
    pub fn new(cfg: &TelegramConfig) -> Result<Self, TelegramError> {
        let call_timeout = Duration::from_secs(cfg.timeout_secs);
        let http = Client::builder()
            .connect_timeout(call_timeout)
            .user_agent(concat!("tgstash/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            call_timeout,
            api_base: cfg.api_base.trim_end_matches('/').to_owned(),
            bot_token: cfg.bot_token.clone(),
            chat_id: cfg.chat_id.clone(),
        })
    }

    // ------------------------------------------------------------------
    // Upload
    // ------------------------------------------------------------------

    /// Post `bytes` as a document and resolve its downloadable path.
    pub async fn upload_document(
        &self,
        bytes: Vec<u8>,
        filename: &str,
    ) -> Result<StoredDocument, TelegramError> {
        let (token, chat_id) = self.credentials()?;

        let size = bytes.len();
        let document = multipart::Part::bytes(bytes).file_name(filename.to_owned());
        let form = multipart::Form::new()
            .text("chat_id", chat_id.to_owned())
            .part("document", document);

        tracing::debug!(filename, size, "Telegram sendDocument");
        let resp = self
            .http
            .post(self.method_url(token, "sendDocument"))
            .timeout(self.call_timeout)
            .multipart(form)
            .send()
            .await?;
        let message: Option<SentMessage> = parse("sendDocument", resp).await?;

        let file_id = message
            .and_then(|m| m.document)
            .and_then(|d| d.file_id.or(d.file_unique_id))
            .filter(|id| !id.is_empty())
            .ok_or(TelegramError::MissingFileId)?;

        let file_path = self.file_path(token, &file_id).await?;
        Ok(StoredDocument { file_id, file_path })
    }

    /// `getFile` — resolve a `file_id` into a download path.
    async fn file_path(&self, token: &str, file_id: &str) -> Result<String, TelegramError> {
        let resp = self
            .http
            .get(self.method_url(token, "getFile"))
            .timeout(self.call_timeout)
            .query(&[("file_id", file_id)])
            .send()
            .await?;
        let info: Option<FileInfo> = parse("getFile", resp).await?;

        info.and_then(|i| i.file_path)
            .filter(|path| !path.is_empty())
            .ok_or(TelegramError::MissingFilePath)
    }

    // ------------------------------------------------------------------
    // Download
    // ------------------------------------------------------------------

    /// Start downloading a stored file. The body is left unread for streaming.
    pub async fn fetch_file(&self, file_path: &str) -> Result<Response, TelegramError> {
        let token = self
            .bot_token
            .as_deref()
            .filter(|t| is_truthy(Some(*t)))
            .ok_or(TelegramError::NotConfigured)?;

        let url = format!("{}/file/bot{}/{}", self.api_base, token, file_path);
        let resp = self.http.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(TelegramError::Status(resp.status().as_u16()));
        }
        Ok(resp)
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn credentials(&self) -> Result<(&str, &str), TelegramError> {
        let token = self.bot_token.as_deref();
        let chat = self.chat_id.as_deref();
        match (token, chat) {
            (Some(token), Some(chat)) if is_truthy(Some(token)) && is_truthy(Some(chat)) => {
                Ok((token, chat))
            }
            _ => Err(TelegramError::NotConfigured),
        }
    }

    fn method_url(&self, token: &str, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, token, method)
    }
}

/// Unwrap a Bot API envelope. Unparseable bodies count as failures.
async fn parse<T: DeserializeOwned>(
    method: &'static str,
    resp: Response,
) -> Result<Option<T>, TelegramError> {
    let status = resp.status();
    let body: Option<ApiResponse<T>> = resp.json().await.ok();

    match body {
        Some(body) if status.is_success() && body.ok => Ok(body.result),
        body => {
            let description = body
                .and_then(|b| b.description)
                .unwrap_or_else(|| format!("Telegram {method} failed: {}", status.as_u16()));
            tracing::warn!(method, status = status.as_u16(), %description, "Telegram API call failed");
            Err(TelegramError::Api(description))
        }
    }
}
