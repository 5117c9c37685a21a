//! Side-table feed synchronizer
//!
//! Local mode: uploads live in one key-value entry, like counters and
//! comment threads in two side-tables keyed by video id. The feed is the
//! persisted uploads plus a fixed built-in sample set, merged with the
//! side-tables on every load.
//!
//! The like contract here is strictly weaker than the document-collection
//! mode: an anonymous monotonic counter with no per-account tracking and
//! no un-like path. The two models are never mixed.

use chrono::{TimeZone, Utc};
use sqlx::SqlitePool;
use tracing::warn;
use uuid::Uuid;

use crate::db::kv;
use crate::error::{Error, Result};
use crate::models::{parse_tags, Comment, LocalVideo, Role, Session, Upload};

/// Built-in demo reels shown alongside local uploads
///
/// Fixed ids and timestamps so side-table entries keyed against them
/// survive restarts.
pub fn sample_reels() -> Vec<Upload> {
    let entries = [
        (
            "Intro to Python Variables",
            "Coding, Python, Beginner",
            "https://samples.reelfeed.example/python-variables.mp4",
            (2024, 1, 10),
        ),
        (
            "Fractions in 60 Seconds",
            "Math, Beginner",
            "https://samples.reelfeed.example/fractions.mp4",
            (2024, 1, 11),
        ),
        (
            "Spanish Greetings",
            "Language, Spanish",
            "https://samples.reelfeed.example/spanish-greetings.mp4",
            (2024, 1, 12),
        ),
    ];

    entries
        .iter()
        .enumerate()
        .map(|(i, (title, tags, url, (y, m, d)))| Upload {
            // Derived from a fixed namespace so the ids never change
            id: Uuid::from_u128(0x5EED_0000_0000_0000_0000_0000_0000_0000 + i as u128),
            title: title.to_string(),
            creator: "reelfeed academy".to_string(),
            tags: parse_tags(tags),
            video_url: url.to_string(),
            created_at: Utc.with_ymd_and_hms(*y, *m, *d, 9, 0, 0).unwrap(),
        })
        .collect()
}

/// Number of built-in sample reels
pub fn sample_count() -> usize {
    sample_reels().len()
}

/// Feed over the key-value store with like/comment side-tables
pub struct LocalFeed {
    pool: SqlitePool,
    session: Session,
    videos: Vec<LocalVideo>,
}

impl LocalFeed {
    /// Build the feed: persisted uploads plus samples, merged with the
    /// side-tables, newest first
    ///
    /// Store failures degrade to an empty projection with a warning.
    pub async fn load(pool: SqlitePool, session: Session) -> Self {
        let videos = match Self::build_projection(&pool).await {
            Ok(videos) => videos,
            Err(e) => {
                warn!("Local feed load failed, showing empty feed: {}", e);
                Vec::new()
            }
        };

        Self {
            pool,
            session,
            videos,
        }
    }

    async fn build_projection(pool: &SqlitePool) -> Result<Vec<LocalVideo>> {
        let mut uploads = kv::load_uploads(pool).await?;
        uploads.extend(sample_reels());

        let like_counts = kv::load_like_counts(pool).await?;
        let mut threads = kv::load_comment_threads(pool).await?;

        let mut videos: Vec<LocalVideo> = uploads
            .into_iter()
            .map(|upload| {
                let likes = like_counts.get(&upload.id).copied().unwrap_or(0);
                let comments = threads.remove(&upload.id).unwrap_or_default();
                LocalVideo::from_upload(upload, likes, comments)
            })
            .collect();

        videos.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(videos)
    }

    /// Current projection
    pub fn videos(&self) -> &[LocalVideo] {
        &self.videos
    }

    /// Session this feed was opened with
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Bump a video's like counter
    ///
    /// Monotonic increment only: no per-account tracking, no un-like.
    /// Read-modify-write of the side-table under this synchronizer's
    /// exclusive access.
    pub async fn toggle_like(&mut self, video_id: Uuid) -> Result<u64> {
        let index = self
            .videos
            .iter()
            .position(|v| v.id == video_id)
            .ok_or_else(|| Error::NotFound(format!("Video {} not in feed", video_id)))?;

        let mut counts = kv::load_like_counts(&self.pool).await?;
        let count = counts.entry(video_id).or_insert(0);
        *count += 1;
        let new_count = *count;
        kv::store_like_counts(&self.pool, &counts).await?;

        self.videos[index].like_count = new_count;

        Ok(new_count)
    }

    /// Post a comment on a video
    ///
    /// Whitespace-only text is dropped silently, same as the remote mode.
    pub async fn post_comment(&mut self, video_id: Uuid, text: &str) -> Result<Option<Comment>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let index = self
            .videos
            .iter()
            .position(|v| v.id == video_id)
            .ok_or_else(|| Error::NotFound(format!("Video {} not in feed", video_id)))?;

        let comment = Comment::new(
            self.session.identity.label().to_string(),
            text.to_string(),
        );

        let mut threads = kv::load_comment_threads(&self.pool).await?;
        threads.entry(video_id).or_default().push(comment.clone());
        kv::store_comment_threads(&self.pool, &threads).await?;

        self.videos[index].comments.push(comment.clone());

        Ok(Some(comment))
    }

    /// Publish a new upload
    ///
    /// Creator accounts only; same title/media validation as the remote
    /// mode. The upload is appended to the persisted list and joins the
    /// projection with zero likes and no comments.
    pub async fn publish(
        &mut self,
        title: &str,
        tags_csv: &str,
        video_url: &str,
    ) -> Result<LocalVideo> {
        if self.session.identity.role != Role::Creator {
            return Err(Error::RoleRequired(Role::Creator));
        }

        let title = title.trim();
        if title.is_empty() {
            return Err(Error::InvalidInput("Title must not be empty".to_string()));
        }

        let video_url = video_url.trim();
        if video_url.is_empty() {
            return Err(Error::InvalidInput(
                "A video reference is required".to_string(),
            ));
        }

        let upload = Upload {
            id: Uuid::new_v4(),
            title: title.to_string(),
            creator: self.session.identity.email.clone(),
            tags: parse_tags(tags_csv),
            video_url: video_url.to_string(),
            created_at: Utc::now(),
        };

        let mut uploads = kv::load_uploads(&self.pool).await?;
        uploads.push(upload.clone());
        kv::store_uploads(&self.pool, &uploads).await?;

        let video = LocalVideo::from_upload(upload, 0, Vec::new());
        self.videos.insert(0, video.clone());

        Ok(video)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Identity;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();

        crate::db::create_kv_table(&pool).await.unwrap();

        pool
    }

    fn session(email: &str, role: Role) -> Session {
        Session::new(Identity {
            uid: Uuid::new_v4(),
            email: email.to_string(),
            role,
        })
    }

    #[tokio::test]
    async fn test_sample_reels_are_stable() {
        let first = sample_reels();
        let second = sample_reels();
        assert_eq!(first.len(), sample_count());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.created_at, b.created_at);
        }
    }

    #[tokio::test]
    async fn test_empty_store_shows_samples_only() {
        let db = setup_test_db().await;
        let feed = LocalFeed::load(db, session("amy@stu.com", Role::Student)).await;
        assert_eq!(feed.videos().len(), sample_count());
        assert!(feed.videos().iter().all(|v| v.like_count == 0));
    }

    #[tokio::test]
    async fn test_feed_length_is_uploads_plus_samples() {
        let db = setup_test_db().await;
        let mut feed = LocalFeed::load(db.clone(), session("pat@cre.com", Role::Creator)).await;

        feed.publish("One", "coding", "https://example.com/1.mp4")
            .await
            .unwrap();
        feed.publish("Two", "music", "https://example.com/2.mp4")
            .await
            .unwrap();

        let reloaded = LocalFeed::load(db, session("pat@cre.com", Role::Creator)).await;
        assert_eq!(reloaded.videos().len(), 2 + sample_count());
        // New uploads sort ahead of the dated samples
        assert_eq!(reloaded.videos()[0].title, "Two");
    }

    #[tokio::test]
    async fn test_three_toggles_count_three() {
        let db = setup_test_db().await;
        let mut feed = LocalFeed::load(db.clone(), session("amy@stu.com", Role::Student)).await;
        let video_id = feed.videos()[0].id;

        assert_eq!(feed.toggle_like(video_id).await.unwrap(), 1);
        assert_eq!(feed.toggle_like(video_id).await.unwrap(), 2);
        assert_eq!(feed.toggle_like(video_id).await.unwrap(), 3);
        assert_eq!(feed.videos()[0].like_count, 3);

        // The counter survives a reload
        let reloaded = LocalFeed::load(db, session("amy@stu.com", Role::Student)).await;
        let reloaded_video = reloaded.videos().iter().find(|v| v.id == video_id).unwrap();
        assert_eq!(reloaded_video.like_count, 3);
    }

    #[tokio::test]
    async fn test_toggle_like_unknown_video() {
        let db = setup_test_db().await;
        let mut feed = LocalFeed::load(db, session("amy@stu.com", Role::Student)).await;

        let err = feed.toggle_like(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_comment_merges_on_reload() {
        let db = setup_test_db().await;
        let mut feed = LocalFeed::load(db.clone(), session("amy@stu.com", Role::Student)).await;
        let video_id = feed.videos()[1].id;

        let comment = feed
            .post_comment(video_id, "very clear")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(comment.author, "amy");

        let reloaded = LocalFeed::load(db, session("bob@stu.com", Role::Student)).await;
        let video = reloaded.videos().iter().find(|v| v.id == video_id).unwrap();
        assert_eq!(video.comments.len(), 1);
        assert_eq!(video.comments[0].text, "very clear");

        // Other videos stayed untouched
        assert!(reloaded
            .videos()
            .iter()
            .filter(|v| v.id != video_id)
            .all(|v| v.comments.is_empty()));
    }

    #[tokio::test]
    async fn test_whitespace_comment_is_dropped() {
        let db = setup_test_db().await;
        let mut feed = LocalFeed::load(db.clone(), session("amy@stu.com", Role::Student)).await;
        let video_id = feed.videos()[0].id;

        assert!(feed.post_comment(video_id, "  \n ").await.unwrap().is_none());
        assert!(feed.videos()[0].comments.is_empty());
        assert!(kv::load_comment_threads(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_student_publish_rejected() {
        let db = setup_test_db().await;
        let mut feed = LocalFeed::load(db.clone(), session("amy@stu.com", Role::Student)).await;

        let err = feed
            .publish("Mine", "coding", "https://example.com/v.mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RoleRequired(Role::Creator)));
        assert!(kv::load_uploads(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_degrades_to_empty_on_store_failure() {
        let db = setup_test_db().await;
        db.close().await;

        let feed = LocalFeed::load(db, session("amy@stu.com", Role::Student)).await;
        assert!(feed.videos().is_empty());
    }
}
