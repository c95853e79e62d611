/// Data access layer
///
/// The feed core only sees the read traits below (`UserLookup`, `LikeIndex`,
/// `PostStore`, `CommentStore`). Write paths used by the post endpoints go
/// through `PostRepository` and `UserRepository`.
///
/// Implementations:
/// - `PgPostStore`, `PgUserStore`, `PgCommentStore`: PostgreSQL via sqlx
/// - `InMemoryStore`: in-process store used by tests
pub mod comment_repo;
pub mod memory;
pub mod post_repo;
pub mod user_repo;

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{AuthorSummary, Comment, Mood, NewPost, Post, User};
use crate::services::mood_ranking::{FeedSort, PostFilter};

pub use comment_repo::PgCommentStore;
pub use memory::InMemoryStore;
pub use post_repo::PgPostStore;
pub use user_repo::PgUserStore;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserLookup: Send + Sync {
    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>>;

    async fn get_followings(&self, user_id: Uuid) -> Result<HashSet<Uuid>>;

    /// Display fields for the given users; unknown ids are simply absent.
    async fn get_profiles(&self, user_ids: Vec<Uuid>) -> Result<HashMap<Uuid, AuthorSummary>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LikeIndex: Send + Sync {
    async fn get_liked_post_ids(&self, user_id: Uuid) -> Result<HashSet<Uuid>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Posts matching `filter`, ordered by `sort`, windowed by `skip`/`limit`.
    /// Also returns the total number of matches.
    async fn query_posts(
        &self,
        filter: &PostFilter,
        sort: &FeedSort,
        skip: usize,
        limit: usize,
    ) -> Result<(Vec<Post>, usize)>;

    /// Most-liked posts of a mood, skipping `exclude_ids`.
    async fn query_top_liked(
        &self,
        mood: Mood,
        exclude_ids: Vec<Uuid>,
        limit: usize,
    ) -> Result<Vec<Post>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Comments grouped by post, newest first within each post.
    async fn comments_for_posts(&self, post_ids: Vec<Uuid>) -> Result<HashMap<Uuid, Vec<Comment>>>;
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>>;

    async fn posts_by_author(&self, author_id: Uuid) -> Result<Vec<Post>>;

    async fn insert_post(&self, new_post: NewPost) -> Result<Post>;

    /// Removes the post together with its comments and likes.
    async fn delete_post(&self, post_id: Uuid) -> Result<bool>;

    /// Returns false when the like already existed.
    async fn add_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool>;

    /// Returns false when there was no like to remove.
    async fn remove_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn update_mood(&self, user_id: Uuid, mood: Mood) -> Result<bool>;

    async fn add_points(&self, user_id: Uuid, points: i64) -> Result<()>;
}
