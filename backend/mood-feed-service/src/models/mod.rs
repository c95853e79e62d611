/// Data models for mood-feed-service
///
/// - User: identity, mood snapshot, and social graph edges
/// - Post: mood-tagged posts with their like set
/// - Comment: comments joined onto feed posts
/// - Feed*: ephemeral request/response shapes of the ranked feed
mod mood;

pub use mood::{Mood, UnknownMood};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::mood_ranking::ScoreBreakdown;

/// Maximum description length accepted on post creation.
pub const MAX_DESCRIPTION_LEN: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(default)]
    pub profile_picture: String,
    #[serde(default)]
    pub current_mood: Mood,
    pub last_login: Option<DateTime<Utc>>,
    #[serde(default)]
    pub points: i64,
}

/// Display fields joined onto posts and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub id: Uuid,
    pub username: String,
    pub profile_picture: String,
}

impl From<&User> for AuthorSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            profile_picture: user.profile_picture.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub description: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub mood: Mood,
    /// Users who liked the post; unique per user.
    #[serde(default)]
    pub likes: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    pub fn is_liked_by(&self, user_id: Uuid) -> bool {
        self.likes.contains(&user_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: Option<AuthorSummary>,
}

/// Why a post is in the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedSource {
    Ranked,
    Inspiration,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPost {
    #[serde(flatten)]
    pub post: Post,
    pub author: Option<AuthorSummary>,
    pub comments: Vec<CommentView>,
    pub like_count: usize,
    /// Present only for weighted (non-neutral) feeds.
    pub score: Option<ScoreBreakdown>,
    pub source: FeedSource,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    pub posts: Vec<FeedPost>,
    /// Count of ranked matches; inspiration posts are not included.
    pub total_posts: usize,
    pub current_page: usize,
    pub total_pages: usize,
}

/// Single post with its discussion, as served by `GET /posts/{id}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub author: Option<AuthorSummary>,
    pub comments: Vec<CommentView>,
    pub like_count: usize,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: Uuid,
    pub description: Option<String>,
    pub image: Option<String>,
    pub mood: Mood,
}
