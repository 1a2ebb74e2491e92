//! File record repository — upload metadata CRUD.
//!
//! File bytes live in Telegram; the key-value store tracks the metadata
//! (filename, size, content type, Telegram file reference, provenance).
//! Records are stored as JSON under `f:{id}`.

use tgstash_common::models::FileRecord;

use crate::error::StoreError;
use crate::kv::{KvStore, ListOptions, ListPage};

/// Key prefix shared by all file records.
pub const KEY_PREFIX: &str = "f:";

/// Store key for a file id.
pub fn key_for(id: &str) -> String {
    format!("{KEY_PREFIX}{id}")
}

// ============================================================
// Create
// ============================================================

/// Persist a new record.
pub async fn create(store: &KvStore, record: &FileRecord) -> Result<(), StoreError> {
    let json = serde_json::to_string(record)?;
    store.put(&key_for(&record.id), &json).await
}

// ============================================================
// Read
// ============================================================

/// Find a record by id.
pub async fn find_by_id(store: &KvStore, id: &str) -> Result<Option<FileRecord>, StoreError> {
    find_by_key(store, &key_for(id)).await
}

/// Find a record by its full store key, as returned by [`list_page`].
pub async fn find_by_key(store: &KvStore, key: &str) -> Result<Option<FileRecord>, StoreError> {
    match store.get(key).await? {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

/// Whether a record exists under `id`, parseable or not.
pub async fn exists(store: &KvStore, id: &str) -> Result<bool, StoreError> {
    Ok(store.get(&key_for(id)).await?.is_some())
}

/// One page of record keys.
pub async fn list_page(
    store: &KvStore,
    limit: usize,
    cursor: Option<&str>,
) -> Result<ListPage, StoreError> {
    store
        .list(ListOptions {
            prefix: KEY_PREFIX,
            limit,
            cursor,
        })
        .await
}

// ============================================================
// Delete
// ============================================================

/// Delete a record. Unknown ids are a no-op.
pub async fn delete(store: &KvStore, id: &str) -> Result<(), StoreError> {
    store.delete(&key_for(id)).await
}
