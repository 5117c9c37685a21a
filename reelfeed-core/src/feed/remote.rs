//! Document-collection feed synchronizer
//!
//! The primary model: one document per video with the liker set and the
//! comment thread embedded. Like toggles are optimistic with a
//! compensating rollback; comments go to the store first and mirror into
//! the projection only after the store confirms.

use sqlx::SqlitePool;
use tracing::warn;
use uuid::Uuid;

use crate::db::videos::{self, NewVideo};
use crate::error::{Error, Result};
use crate::models::{parse_tags, Comment, Role, Session, Video};

/// Feed over the video document collection
///
/// Owns a transient projection rebuilt on each load; the collection holds
/// all durable state.
pub struct RemoteFeed {
    pool: SqlitePool,
    session: Session,
    videos: Vec<Video>,
}

impl RemoteFeed {
    /// Load every video, newest first
    ///
    /// A store failure degrades to an empty projection rather than
    /// propagating; the caller sees an empty feed and may reload.
    pub async fn load_all(pool: SqlitePool, session: Session) -> Self {
        let videos = match videos::fetch_all(&pool).await {
            Ok(videos) => videos,
            Err(e) => {
                warn!("Feed load failed, showing empty feed: {}", e);
                Vec::new()
            }
        };

        Self {
            pool,
            session,
            videos,
        }
    }

    /// Load one creator's videos, newest first
    ///
    /// Same degrade-to-empty policy as [`load_all`](Self::load_all).
    pub async fn load_for_creator(pool: SqlitePool, session: Session, creator_id: Uuid) -> Self {
        let videos = match videos::fetch_by_creator(&pool, creator_id).await {
            Ok(videos) => videos,
            Err(e) => {
                warn!(
                    "Feed load for creator {} failed, showing empty feed: {}",
                    creator_id, e
                );
                Vec::new()
            }
        };

        Self {
            pool,
            session,
            videos,
        }
    }

    /// Current projection
    pub fn videos(&self) -> &[Video] {
        &self.videos
    }

    /// Session this feed was opened with
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Toggle the current account's membership in a video's liker set
    ///
    /// Two-phase: the projection is patched first so the caller sees the
    /// change immediately, then the store request is issued; if the store
    /// fails the patch is reversed and the error surfaced, so projection
    /// and store never silently diverge.
    ///
    /// Membership is computed from the projection, not the store, so two
    /// sessions toggling the same video concurrently can race; the store's
    /// set union/removal keeps the set well-formed either way.
    pub async fn toggle_like(&mut self, video_id: Uuid) -> Result<&Video> {
        let uid = self.session.identity.uid;

        let index = self
            .videos
            .iter()
            .position(|v| v.id == video_id)
            .ok_or_else(|| Error::NotFound(format!("Video {} not in feed", video_id)))?;

        let was_liked = self.videos[index].is_liked_by(uid);

        // Tentative local patch
        if was_liked {
            self.videos[index].likes.retain(|id| *id != uid);
        } else {
            self.videos[index].likes.push(uid);
        }

        let outcome = if was_liked {
            videos::remove_liker(&self.pool, video_id, uid).await
        } else {
            videos::add_liker(&self.pool, video_id, uid).await
        };

        if let Err(e) = outcome {
            // Compensating rollback: restore the pre-toggle membership
            if was_liked {
                self.videos[index].likes.push(uid);
            } else {
                self.videos[index].likes.retain(|id| *id != uid);
            }
            warn!("Like toggle on {} failed, rolled back: {}", video_id, e);
            return Err(e);
        }

        Ok(&self.videos[index])
    }

    /// Post a comment on a video
    ///
    /// Whitespace-only text is dropped silently: `Ok(None)`, no store call,
    /// no projection change. Otherwise the comment is appended in the store
    /// first and mirrored into the projection once confirmed.
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

        videos::append_comment(&self.pool, video_id, &comment).await?;
        self.videos[index].comments.push(comment.clone());

        Ok(Some(comment))
    }

    /// Publish a new video
    ///
    /// Creator accounts only. Title and media reference must be non-empty
    /// after trimming; both are checked before any store call. The new
    /// document starts with empty likes and comments and is prepended to
    /// the projection (it is the newest item).
    pub async fn publish(
        &mut self,
        title: &str,
        tags_csv: &str,
        video_url: &str,
    ) -> Result<Video> {
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

        let video = videos::insert(
            &self.pool,
            NewVideo {
                title: title.to_string(),
                video_url: video_url.to_string(),
                tags: parse_tags(tags_csv),
                creator_id: self.session.identity.uid,
                creator_name: self.session.identity.label().to_string(),
            },
        )
        .await?;

        self.videos.insert(0, video.clone());

        Ok(video)
    }

    /// Delete a video from the store and the projection
    ///
    /// Boolean contract: true only when the store confirms a row was
    /// removed. Role mismatch and store failures both report false, with
    /// the reason logged rather than surfaced.
    pub async fn delete(&mut self, video_id: Uuid) -> bool {
        if self.session.identity.role != Role::Creator {
            warn!("Delete of {} refused: creator role required", video_id);
            return false;
        }

        match videos::delete(&self.pool, video_id).await {
            Ok(true) => {
                self.videos.retain(|v| v.id != video_id);
                true
            }
            Ok(false) => false,
            Err(e) => {
                warn!("Delete of {} failed: {}", video_id, e);
                false
            }
        }
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

        crate::db::create_videos_table(&pool).await.unwrap();

        pool
    }

    fn session(email: &str, role: Role) -> Session {
        Session::new(Identity {
            uid: Uuid::new_v4(),
            email: email.to_string(),
            role,
        })
    }

    async fn creator_feed(pool: &SqlitePool) -> RemoteFeed {
        RemoteFeed::load_all(pool.clone(), session("pat@cre.com", Role::Creator)).await
    }

    #[tokio::test]
    async fn test_publish_requires_creator_role() {
        let db = setup_test_db().await;
        let mut feed =
            RemoteFeed::load_all(db.clone(), session("amy@stu.com", Role::Student)).await;

        let err = feed
            .publish("Intro to Loops", "coding", "https://example.com/loops.mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RoleRequired(Role::Creator)));
    }

    #[tokio::test]
    async fn test_publish_validates_before_store_call() {
        let db = setup_test_db().await;
        let mut feed = creator_feed(&db).await;

        let err = feed
            .publish("   ", "coding", "https://example.com/v.mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let err = feed.publish("Intro", "coding", "  ").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        // Neither attempt reached the store
        assert!(videos::fetch_all(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_publish_prepends_and_parses_tags() {
        let db = setup_test_db().await;
        let mut feed = creator_feed(&db).await;

        feed.publish("First", "", "https://example.com/1.mp4")
            .await
            .unwrap();
        let video = feed
            .publish(
                "Second",
                "Coding, Python, , Beginner",
                "https://example.com/2.mp4",
            )
            .await
            .unwrap();

        assert_eq!(video.tags, vec!["Coding", "Python", "Beginner"]);
        assert!(video.likes.is_empty());
        assert!(video.comments.is_empty());
        assert_eq!(video.creator_name, "pat");

        // Newest item leads the projection
        assert_eq!(feed.videos()[0].title, "Second");
        assert_eq!(feed.videos()[1].title, "First");
    }

    #[tokio::test]
    async fn test_toggle_like_round_trip() {
        let db = setup_test_db().await;
        let mut feed = creator_feed(&db).await;
        let video = feed
            .publish("Intro", "coding", "https://example.com/v.mp4")
            .await
            .unwrap();
        let uid = feed.session().identity.uid;

        let liked = feed.toggle_like(video.id).await.unwrap();
        assert!(liked.is_liked_by(uid));

        let unliked = feed.toggle_like(video.id).await.unwrap();
        assert!(!unliked.is_liked_by(uid));

        // The store agrees with the projection after both toggles
        let stored = videos::fetch_one(&db, video.id).await.unwrap().unwrap();
        assert!(stored.likes.is_empty());
    }

    #[tokio::test]
    async fn test_toggle_like_unknown_video() {
        let db = setup_test_db().await;
        let mut feed = creator_feed(&db).await;

        let err = feed.toggle_like(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_toggle_like_rolls_back_on_store_failure() {
        let db = setup_test_db().await;
        let mut feed = creator_feed(&db).await;
        let video = feed
            .publish("Intro", "coding", "https://example.com/v.mp4")
            .await
            .unwrap();
        let uid = feed.session().identity.uid;

        // Delete underneath the projection so the store call fails
        videos::delete(&db, video.id).await.unwrap();

        let err = feed.toggle_like(video.id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        // The tentative patch was reversed
        assert!(!feed.videos()[0].is_liked_by(uid));
    }

    #[tokio::test]
    async fn test_post_comment_drops_whitespace_only() {
        let db = setup_test_db().await;
        let mut feed = creator_feed(&db).await;
        let video = feed
            .publish("Intro", "coding", "https://example.com/v.mp4")
            .await
            .unwrap();

        let posted = feed.post_comment(video.id, "   \t  ").await.unwrap();
        assert!(posted.is_none());

        // Neither projection nor store changed
        assert_eq!(feed.videos()[0].comment_count(), 0);
        let stored = videos::fetch_one(&db, video.id).await.unwrap().unwrap();
        assert_eq!(stored.comment_count(), 0);
    }

    #[tokio::test]
    async fn test_post_comment_trims_and_mirrors() {
        let db = setup_test_db().await;
        let mut feed = creator_feed(&db).await;
        let video = feed
            .publish("Intro", "coding", "https://example.com/v.mp4")
            .await
            .unwrap();

        let comment = feed
            .post_comment(video.id, "  great lesson  ")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(comment.text, "great lesson");
        assert_eq!(comment.author, "pat");

        assert_eq!(feed.videos()[0].comment_count(), 1);
        let stored = videos::fetch_one(&db, video.id).await.unwrap().unwrap();
        assert_eq!(stored.comments[0].text, "great lesson");
    }

    #[tokio::test]
    async fn test_post_comment_vanished_video_surfaces_error() {
        let db = setup_test_db().await;
        let mut feed = creator_feed(&db).await;
        let video = feed
            .publish("Intro", "coding", "https://example.com/v.mp4")
            .await
            .unwrap();

        videos::delete(&db, video.id).await.unwrap();

        let err = feed.post_comment(video.id, "hello").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        // Comments are store-first, so the projection stayed clean
        assert_eq!(feed.videos()[0].comment_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_removes_from_store_and_projection() {
        let db = setup_test_db().await;
        let mut feed = creator_feed(&db).await;
        let video = feed
            .publish("Intro", "coding", "https://example.com/v.mp4")
            .await
            .unwrap();

        assert!(feed.delete(video.id).await);
        assert!(feed.videos().is_empty());
        assert!(videos::fetch_one(&db, video.id).await.unwrap().is_none());

        // Second delete reports false
        assert!(!feed.delete(video.id).await);
    }

    #[tokio::test]
    async fn test_delete_refused_for_students() {
        let db = setup_test_db().await;
        let mut creator = creator_feed(&db).await;
        let video = creator
            .publish("Intro", "coding", "https://example.com/v.mp4")
            .await
            .unwrap();

        let mut student =
            RemoteFeed::load_all(db.clone(), session("amy@stu.com", Role::Student)).await;
        assert!(!student.delete(video.id).await);

        // The record is untouched
        assert!(videos::fetch_one(&db, video.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_load_for_creator_filters() {
        let db = setup_test_db().await;
        let mut mine = creator_feed(&db).await;
        let mut theirs =
            RemoteFeed::load_all(db.clone(), session("kim@cre.com", Role::Creator)).await;

        mine.publish("Mine", "coding", "https://example.com/m.mp4")
            .await
            .unwrap();
        theirs
            .publish("Theirs", "music", "https://example.com/t.mp4")
            .await
            .unwrap();

        let creator_id = mine.session().identity.uid;
        let reloaded =
            RemoteFeed::load_for_creator(db.clone(), mine.session().clone(), creator_id).await;
        assert_eq!(reloaded.videos().len(), 1);
        assert_eq!(reloaded.videos()[0].title, "Mine");
    }

    #[tokio::test]
    async fn test_load_degrades_to_empty_on_store_failure() {
        let db = setup_test_db().await;
        db.close().await;

        let feed = RemoteFeed::load_all(db, session("amy@stu.com", Role::Student)).await;
        assert!(feed.videos().is_empty());
    }
}
