//! Key-value store access
//!
//! JSON values in the `kv_store` table back the local feed mode and the
//! persisted session. Typed wrappers cover the fixed keys; the generic
//! get/set pair is the whole surface the rest of the crate goes through.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::warn;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Comment, Session, Upload};

/// Persisted session
pub const KEY_SESSION: &str = "session";
/// Locally published uploads, newest appended last
pub const KEY_CREATOR_UPLOADS: &str = "creator_uploads";
/// Anonymous like counters keyed by video id
pub const KEY_LIKE_COUNTS: &str = "like_counts";
/// Comment threads keyed by video id
pub const KEY_COMMENT_THREADS: &str = "comment_threads";

/// Generic JSON getter
///
/// Returns None if the key doesn't exist. A stored value that fails to
/// deserialize is treated the same as an absent one: the corrupt entry is
/// logged and skipped, it never aborts a read path.
pub async fn get_json<T: DeserializeOwned>(db: &SqlitePool, key: &str) -> Result<Option<T>> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM kv_store WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await?;

    match value {
        Some(s) => match serde_json::from_str::<T>(&s) {
            Ok(parsed) => Ok(Some(parsed)),
            Err(e) => {
                warn!("Discarding malformed value for key '{}': {}", key, e);
                Ok(None)
            }
        },
        None => Ok(None),
    }
}

/// Generic JSON setter
///
/// Inserts or updates the key in one statement.
pub async fn set_json<T: Serialize>(db: &SqlitePool, key: &str, value: &T) -> Result<()> {
    let value_str = serde_json::to_string(value)?;

    sqlx::query(
        r#"
        INSERT INTO kv_store (key, value)
        VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(key)
    .bind(value_str)
    .execute(db)
    .await?;

    Ok(())
}

/// Remove a key; removing an absent key is a no-op
pub async fn remove(db: &SqlitePool, key: &str) -> Result<()> {
    sqlx::query("DELETE FROM kv_store WHERE key = ?")
        .bind(key)
        .execute(db)
        .await?;

    Ok(())
}

/// Load the persisted session, if any
pub async fn load_session(db: &SqlitePool) -> Result<Option<Session>> {
    get_json(db, KEY_SESSION).await
}

/// Persist the session across restarts
pub async fn store_session(db: &SqlitePool, session: &Session) -> Result<()> {
    set_json(db, KEY_SESSION, session).await
}

/// Drop the persisted session
pub async fn clear_session(db: &SqlitePool) -> Result<()> {
    remove(db, KEY_SESSION).await
}

/// Load local uploads; absent or corrupt key reads as an empty list
pub async fn load_uploads(db: &SqlitePool) -> Result<Vec<Upload>> {
    Ok(get_json(db, KEY_CREATOR_UPLOADS).await?.unwrap_or_default())
}

/// Replace the local uploads list
pub async fn store_uploads(db: &SqlitePool, uploads: &[Upload]) -> Result<()> {
    set_json(db, KEY_CREATOR_UPLOADS, &uploads).await
}

/// Load the like counter map; absent or corrupt key reads as empty
pub async fn load_like_counts(db: &SqlitePool) -> Result<HashMap<Uuid, u64>> {
    Ok(get_json(db, KEY_LIKE_COUNTS).await?.unwrap_or_default())
}

/// Replace the like counter map
pub async fn store_like_counts(db: &SqlitePool, counts: &HashMap<Uuid, u64>) -> Result<()> {
    set_json(db, KEY_LIKE_COUNTS, counts).await
}

/// Load the comment thread map; absent or corrupt key reads as empty
pub async fn load_comment_threads(db: &SqlitePool) -> Result<HashMap<Uuid, Vec<Comment>>> {
    Ok(get_json(db, KEY_COMMENT_THREADS).await?.unwrap_or_default())
}

/// Replace the comment thread map
pub async fn store_comment_threads(
    db: &SqlitePool,
    threads: &HashMap<Uuid, Vec<Comment>>,
) -> Result<()> {
    set_json(db, KEY_COMMENT_THREADS, threads).await
}
