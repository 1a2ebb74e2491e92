//! Key-value store contract used for file metadata.
//!
//! Handlers only ever need `get`, `put`, `delete` and a paginated, prefix-filtered
//! `list`. Two backends provide it: Redis for deployments and an in-process map
//! for lite mode and tests.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use redis::aio::ConnectionManager;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::redis_pool;

/// Sorted set holding every key written through [`RedisStore`].
pub const KEY_INDEX: &str = "kv:keys";

/// Parameters for [`KvStore::list`].
#[derive(Debug, Clone, Copy)]
pub struct ListOptions<'a> {
    pub prefix: &'a str,
    /// Maximum number of keys in the page; 0 is treated as 1.
    pub limit: usize,
    /// Cursor from a previous page.
    pub cursor: Option<&'a str>,
}

/// One page of keys, in lexicographic order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPage {
    pub keys: Vec<String>,
    /// Opaque token for the next page; `None` once the listing is complete.
    pub cursor: Option<String>,
    pub list_complete: bool,
}

/// Key-value backend selected at startup.
#[derive(Clone)]
pub enum KvStore {
    Redis(RedisStore),
    Memory(MemoryStore),
}

impl KvStore {
    pub async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self {
            Self::Redis(store) => store.get(key).await,
            Self::Memory(store) => Ok(store.get(key).await),
        }
    }

    pub async fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        match self {
            Self::Redis(store) => store.put(key, value).await,
            Self::Memory(store) => {
                store.put(key, value).await;
                Ok(())
            }
        }
    }

    /// Remove a key. Deleting a key that does not exist succeeds.
    pub async fn delete(&self, key: &str) -> Result<(), StoreError> {
        match self {
            Self::Redis(store) => store.delete(key).await,
            Self::Memory(store) => {
                store.delete(key).await;
                Ok(())
            }
        }
    }

    pub async fn list(&self, opts: ListOptions<'_>) -> Result<ListPage, StoreError> {
        let after = opts.cursor.map(decode_cursor).transpose()?;
        if let Some(after) = &after {
            if !after.starts_with(opts.prefix) {
                return Err(StoreError::InvalidCursor);
            }
        }

        let limit = opts.limit.max(1);
        // One extra key tells us whether another page exists.
        let fetch = limit + 1;
        let mut keys = match self {
            Self::Redis(store) => store.keys_after(opts.prefix, after.as_deref(), fetch).await?,
            Self::Memory(store) => store.keys_after(opts.prefix, after.as_deref(), fetch).await,
        };

        let list_complete = keys.len() <= limit;
        keys.truncate(limit);
        let cursor = if list_complete {
            None
        } else {
            keys.last().map(|key| encode_cursor(key))
        };

        Ok(ListPage {
            keys,
            cursor,
            list_complete,
        })
    }
}

fn encode_cursor(key: &str) -> String {
    URL_SAFE_NO_PAD.encode(key.as_bytes())
}

fn decode_cursor(cursor: &str) -> Result<String, StoreError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(cursor)
        .map_err(|_| StoreError::InvalidCursor)?;
    String::from_utf8(bytes).map_err(|_| StoreError::InvalidCursor)
}

// ============================================================
// Redis
// ============================================================

/// Redis-backed store. Cheap to clone; clones share one managed connection.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        Ok(redis_pool::get(&mut conn, key).await?)
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        Ok(redis_pool::set_indexed(&mut conn, KEY_INDEX, key, value).await?)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        Ok(redis_pool::del_indexed(&mut conn, KEY_INDEX, key).await?)
    }

    async fn keys_after(
        &self,
        prefix: &str,
        after: Option<&str>,
        count: usize,
    ) -> Result<Vec<String>, StoreError> {
        let min = match after {
            Some(key) => format!("({key}"),
            None => format!("[{prefix}"),
        };
        let mut conn = self.conn.clone();
        let members = redis_pool::range_by_lex(&mut conn, KEY_INDEX, &min, count).await?;
        // Prefix keys are contiguous in lexicographic order.
        Ok(members
            .into_iter()
            .take_while(|key| key.starts_with(prefix))
            .collect())
    }
}

// ============================================================
// Memory
// ============================================================

/// In-process store. Contents are lost on restart.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemoryStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    async fn put(&self, key: &str, value: &str) {
        self.entries
            .write()
            .await
            .insert(key.to_owned(), value.to_owned());
    }

    async fn delete(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    async fn keys_after(&self, prefix: &str, after: Option<&str>, count: usize) -> Vec<String> {
        let start = match after {
            Some(key) => Bound::Excluded(key.to_owned()),
            None => Bound::Included(prefix.to_owned()),
        };
        self.entries
            .read()
            .await
            .range((start, Bound::Unbounded))
            .map(|(key, _)| key)
            .take_while(|key| key.starts_with(prefix))
            .take(count)
            .cloned()
            .collect()
    }
}
