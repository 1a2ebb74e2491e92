//! # tgstash-db
//!
//! Storage layer for tgstash. Manages:
//! - **Key-value store** — file metadata records, Redis-backed or in-process (lite mode)
//! - **Telegram Bot API** — durable storage for the file bytes themselves

pub mod error;
pub mod kv;
pub mod redis_pool;
pub mod repository;
pub mod telegram;

use anyhow::Result;
use tgstash_common::config::AppConfig;

pub use error::StoreError;
pub use kv::{KvStore, ListOptions, ListPage, MemoryStore, RedisStore};

/// Shared database state passed through Axum extractors.
#[derive(Clone)]
pub struct Database {
    pub kv: KvStore,
}

impl Database {
    /// Connect to the configured key-value backend.
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let kv = match config.store.redis_url.as_deref().filter(|url| !url.is_empty()) {
            Some(url) => {
                tracing::info!("Connecting to Redis...");
                let client = redis::Client::open(url)?;
                let conn = redis::aio::ConnectionManager::new(client).await?;
                tracing::info!("Connected to Redis");
                KvStore::Redis(RedisStore::new(conn))
            }
            None => {
                tracing::warn!("No store.redis_url configured, metadata is kept in memory only");
                KvStore::Memory(MemoryStore::default())
            }
        };

        Ok(Self { kv })
    }

    /// In-process store, for lite mode and tests.
    pub fn in_memory() -> Self {
        Self {
            kv: KvStore::Memory(MemoryStore::default()),
        }
    }
}
