//! Video collection database operations
//!
//! One row per document; the liker set and comment list are JSON arrays in
//! TEXT columns. Set union, set removal and comment append are single
//! UPDATE statements, so two clients mutating the same document never
//! interleave a read-modify-write.

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Comment, Video};

/// Draft for a document the store has not assigned an id yet
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub title: String,
    pub video_url: String,
    pub tags: Vec<String>,
    pub creator_id: Uuid,
    pub creator_name: String,
}

/// Insert a new document and return it
///
/// The store assigns the id and creation time; likes and comments start
/// empty. The returned `Video` is exactly what a subsequent fetch would see.
pub async fn insert(pool: &SqlitePool, new: NewVideo) -> Result<Video> {
    let video = Video {
        id: Uuid::new_v4(),
        title: new.title,
        video_url: new.video_url,
        tags: new.tags,
        creator_id: new.creator_id,
        creator_name: new.creator_name,
        likes: Vec::new(),
        comments: Vec::new(),
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO videos (guid, title, video_url, tags, creator_id, creator_name, likes, comments, created_at)
        VALUES (?, ?, ?, ?, ?, ?, '[]', '[]', ?)
        "#,
    )
    .bind(video.id.to_string())
    .bind(&video.title)
    .bind(&video.video_url)
    .bind(serde_json::to_string(&video.tags)?)
    .bind(video.creator_id.to_string())
    .bind(&video.creator_name)
    .bind(video.created_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(video)
}

/// Fetch every document, newest first
pub async fn fetch_all(pool: &SqlitePool) -> Result<Vec<Video>> {
    let rows = sqlx::query(
        r#"
        SELECT guid, title, video_url, tags, creator_id, creator_name, likes, comments, created_at
        FROM videos
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(video_from_row).collect()
}

/// Fetch one creator's documents, newest first
pub async fn fetch_by_creator(pool: &SqlitePool, creator_id: Uuid) -> Result<Vec<Video>> {
    let rows = sqlx::query(
        r#"
        SELECT guid, title, video_url, tags, creator_id, creator_name, likes, comments, created_at
        FROM videos
        WHERE creator_id = ?
        ORDER BY created_at DESC
        "#,
    )
    .bind(creator_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(video_from_row).collect()
}

/// Fetch a single document by id
pub async fn fetch_one(pool: &SqlitePool, video_id: Uuid) -> Result<Option<Video>> {
    let row = sqlx::query(
        r#"
        SELECT guid, title, video_url, tags, creator_id, creator_name, likes, comments, created_at
        FROM videos
        WHERE guid = ?
        "#,
    )
    .bind(video_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.map(video_from_row).transpose()
}

/// Add an account to a document's liker set
///
/// Idempotent set union in one statement: a uid already present leaves the
/// array untouched, so repeated or racing calls cannot double-count.
pub async fn add_liker(pool: &SqlitePool, video_id: Uuid, uid: Uuid) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE videos
        SET likes = CASE
            WHEN EXISTS (SELECT 1 FROM json_each(videos.likes) WHERE json_each.value = ?1)
                THEN likes
            ELSE json_insert(likes, '$[#]', ?1)
        END
        WHERE guid = ?2
        "#,
    )
    .bind(uid.to_string())
    .bind(video_id.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Video {} not found", video_id)));
    }

    Ok(())
}

/// Remove an account from a document's liker set
///
/// Removing a uid that isn't present leaves the set unchanged.
pub async fn remove_liker(pool: &SqlitePool, video_id: Uuid, uid: Uuid) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE videos
        SET likes = (
            SELECT COALESCE(json_group_array(json_each.value), '[]')
            FROM json_each(videos.likes)
            WHERE json_each.value <> ?1
        )
        WHERE guid = ?2
        "#,
    )
    .bind(uid.to_string())
    .bind(video_id.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Video {} not found", video_id)));
    }

    Ok(())
}

/// Append a comment to a document's thread
///
/// `json(?1)` embeds the serialized comment as an object rather than a
/// quoted string.
pub async fn append_comment(pool: &SqlitePool, video_id: Uuid, comment: &Comment) -> Result<()> {
    let payload = serde_json::to_string(comment)?;

    let result = sqlx::query(
        r#"
        UPDATE videos
        SET comments = json_insert(comments, '$[#]', json(?1))
        WHERE guid = ?2
        "#,
    )
    .bind(payload)
    .bind(video_id.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Video {} not found", video_id)));
    }

    Ok(())
}

/// Delete a document; Ok(false) when it was already gone
pub async fn delete(pool: &SqlitePool, video_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM videos WHERE guid = ?")
        .bind(video_id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

fn video_from_row(row: sqlx::sqlite::SqliteRow) -> Result<Video> {
    let id_str: String = row.get("guid");
    let id = Uuid::parse_str(&id_str)
        .map_err(|e| Error::Internal(format!("Failed to parse video guid: {}", e)))?;

    let creator_id_str: String = row.get("creator_id");
    let creator_id = Uuid::parse_str(&creator_id_str)
        .map_err(|e| Error::Internal(format!("Failed to parse creator_id: {}", e)))?;

    let tags: String = row.get("tags");
    let tags: Vec<String> = serde_json::from_str(&tags)?;

    let likes: String = row.get("likes");
    let likes: Vec<Uuid> = serde_json::from_str(&likes)?;

    let comments: String = row.get("comments");
    let comments: Vec<Comment> = serde_json::from_str(&comments)?;

    let created_at: String = row.get("created_at");
    let created_at = chrono::DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| Error::Internal(format!("Failed to parse created_at: {}", e)))?
        .with_timezone(&chrono::Utc);

    Ok(Video {
        id,
        title: row.get("title"),
        video_url: row.get("video_url"),
        tags,
        creator_id,
        creator_name: row.get("creator_name"),
        likes,
        comments,
        created_at,
    })
}
