//! Redis connection helpers.
//!
//! Every write goes through a `MULTI` pipeline that also maintains a sorted-set
//! index of all keys, so listings can page through keys in lexicographic order
//! with exact page sizes (plain `SCAN` only treats `COUNT` as a hint).

use redis::AsyncCommands;
use redis::aio::ConnectionManager;

/// Get a value by key.
pub async fn get(conn: &mut ConnectionManager, key: &str) -> Result<Option<String>, redis::RedisError> {
    conn.get(key).await
}

/// Set a key and record it in `index`, atomically.
pub async fn set_indexed(
    conn: &mut ConnectionManager,
    index: &str,
    key: &str,
    value: &str,
) -> Result<(), redis::RedisError> {
    let _: () = redis::pipe()
        .atomic()
        .set(key, value)
        .ignore()
        .zadd(index, key, 0)
        .ignore()
        .query_async(conn)
        .await?;
    Ok(())
}

/// Delete a key and drop it from `index`, atomically. Missing keys are fine.
pub async fn del_indexed(
    conn: &mut ConnectionManager,
    index: &str,
    key: &str,
) -> Result<(), redis::RedisError> {
    let _: () = redis::pipe()
        .atomic()
        .del(key)
        .ignore()
        .zrem(index, key)
        .ignore()
        .query_async(conn)
        .await?;
    Ok(())
}

/// Up to `count` index members starting at the lexicographic bound `min`
/// (`[key` inclusive, `(key` exclusive).
pub async fn range_by_lex(
    conn: &mut ConnectionManager,
    index: &str,
    min: &str,
    count: usize,
) -> Result<Vec<String>, redis::RedisError> {
    let count = isize::try_from(count).unwrap_or(isize::MAX);
    conn.zrangebylex_limit(index, min, "+", 0, count).await
}
