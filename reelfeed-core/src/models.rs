//! Data model shared by the feed synchronizers and storage layers
//!
//! `Video` is the document-store shape; `Upload` and `LocalVideo` belong to
//! the local key-value mode, which tracks likes and comments in side-tables
//! instead of on the record itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account role, derived from the sign-in email domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Browses the feed, likes, comments
    Student,
    /// Additionally publishes and deletes own videos
    Creator,
}

impl std::str::FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "creator" => Ok(Role::Creator),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Student => write!(f, "student"),
            Role::Creator => write!(f, "creator"),
        }
    }
}

/// Signed-in account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// Assigned at login, never re-derived from the email
    pub uid: Uuid,
    pub email: String,
    pub role: Role,
}

impl Identity {
    /// Cosmetic author label: the part of the email before the first '@'
    pub fn label(&self) -> &str {
        self.email.split('@').next().unwrap_or(&self.email)
    }
}

/// Explicit session handle passed into every feed operation
///
/// There is no process-wide current user; callers own the session and hand
/// it to the synchronizer they construct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub identity: Identity,
    pub started_at: DateTime<Utc>,
}

impl Session {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            started_at: Utc::now(),
        }
    }
}

/// Append-only comment; no edit or delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub author: String,
    pub text: String,
    pub posted_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(author: String, text: String) -> Self {
        Self {
            author,
            text,
            posted_at: Utc::now(),
        }
    }
}

/// Video document as stored in the document collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    /// Store-assigned, immutable
    pub id: Uuid,
    pub title: String,
    pub video_url: String,
    /// Flat ordered list, duplicates allowed
    pub tags: Vec<String>,
    pub creator_id: Uuid,
    pub creator_name: String,
    /// Liker set: at most one entry per account
    pub likes: Vec<Uuid>,
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
}

impl Video {
    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    pub fn is_liked_by(&self, uid: Uuid) -> bool {
        self.likes.contains(&uid)
    }

    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }
}

/// Local-mode upload record
///
/// Likes and comments are deliberately absent: the local mode keeps them in
/// side-tables keyed by video id, so an upload never changes after publish.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Upload {
    pub id: Uuid,
    pub title: String,
    /// Full email of the publishing account
    pub creator: String,
    pub tags: Vec<String>,
    pub video_url: String,
    pub created_at: DateTime<Utc>,
}

/// Local-mode feed item: an upload merged with its side-table state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalVideo {
    pub id: Uuid,
    pub title: String,
    pub creator: String,
    pub tags: Vec<String>,
    pub video_url: String,
    pub created_at: DateTime<Utc>,
    /// Anonymous monotonic counter, not a liker set
    pub like_count: u64,
    pub comments: Vec<Comment>,
}

impl LocalVideo {
    pub fn from_upload(upload: Upload, like_count: u64, comments: Vec<Comment>) -> Self {
        Self {
            id: upload.id,
            title: upload.title,
            creator: upload.creator,
            tags: upload.tags,
            video_url: upload.video_url,
            created_at: upload.created_at,
            like_count,
            comments,
        }
    }
}

/// Split a comma-separated tag string into clean tags
///
/// Each segment is trimmed; empty segments are dropped. No deduplication.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags_trims_and_drops_empties() {
        assert_eq!(
            parse_tags("Coding, Python, , Beginner"),
            vec!["Coding", "Python", "Beginner"]
        );
        assert_eq!(parse_tags(""), Vec::<String>::new());
        assert_eq!(parse_tags(" , ,,"), Vec::<String>::new());
        assert_eq!(parse_tags("solo"), vec!["solo"]);
    }

    #[test]
    fn test_parse_tags_keeps_order_and_duplicates() {
        assert_eq!(parse_tags("b, a, b"), vec!["b", "a", "b"]);
    }

    #[test]
    fn test_identity_label() {
        let identity = Identity {
            uid: Uuid::new_v4(),
            email: "amy@stu.com".to_string(),
            role: Role::Student,
        };
        assert_eq!(identity.label(), "amy");
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("student".parse(), Ok(Role::Student));
        assert_eq!("CREATOR".parse(), Ok(Role::Creator));
        assert_eq!("admin".parse::<Role>(), Err(()));
        assert_eq!("".parse::<Role>(), Err(()));
    }

    #[test]
    fn test_role_display_matches_serde() {
        assert_eq!(Role::Student.to_string(), "student");
        assert_eq!(Role::Creator.to_string(), "creator");
        // Display and the serialized form agree
        assert_eq!(
            serde_json::to_string(&Role::Creator).unwrap(),
            "\"creator\""
        );
    }

    #[test]
    fn test_video_like_helpers() {
        let uid = Uuid::new_v4();
        let other = Uuid::new_v4();
        let video = Video {
            id: Uuid::new_v4(),
            title: "Intro to Loops".to_string(),
            video_url: "https://example.com/loops.mp4".to_string(),
            tags: vec!["coding".to_string()],
            creator_id: Uuid::new_v4(),
            creator_name: "pat".to_string(),
            likes: vec![uid],
            comments: Vec::new(),
            created_at: Utc::now(),
        };
        assert_eq!(video.like_count(), 1);
        assert!(video.is_liked_by(uid));
        assert!(!video.is_liked_by(other));
        assert_eq!(video.comment_count(), 0);
    }
}
