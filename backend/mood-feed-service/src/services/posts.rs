/// Post service - creation, retrieval, deletion and likes
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::db::{CommentStore, PostRepository, UserLookup, UserRepository};
use crate::error::{AppError, Result};
use crate::models::{Mood, NewPost, Post, PostDetail, MAX_DESCRIPTION_LEN};
use crate::services::augmentation::{Augmenter, Discussion};

/// Points credited to an author for each new post.
pub const POST_CREATION_POINTS: i64 = 10;

pub struct PostService {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
    augmenter: Augmenter,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        lookup: Arc<dyn UserLookup>,
        comments: Arc<dyn CommentStore>,
    ) -> Self {
        Self {
            posts,
            users,
            augmenter: Augmenter::new(lookup, comments),
        }
    }

    /// Create a post and credit the author.
    pub async fn create_post(
        &self,
        author_id: Uuid,
        description: Option<String>,
        image: Option<String>,
        mood: Mood,
    ) -> Result<Post> {
        let description = description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        let image = image.map(|i| i.trim().to_string()).filter(|i| !i.is_empty());

        if description.is_none() && image.is_none() {
            return Err(AppError::ValidationError(
                "A post needs a description or an image".to_string(),
            ));
        }
        if let Some(text) = &description {
            if text.chars().count() > MAX_DESCRIPTION_LEN {
                return Err(AppError::ValidationError(format!(
                    "Description must be at most {} characters",
                    MAX_DESCRIPTION_LEN
                )));
            }
        }

        let post = self
            .posts
            .insert_post(NewPost {
                author_id,
                description,
                image,
                mood,
            })
            .await?;

        self.users
            .add_points(author_id, POST_CREATION_POINTS)
            .await?;

        info!(post_id = %post.id, author_id = %author_id, mood = %post.mood, "post created");
        Ok(post)
    }

    /// Get a post with its author and comments.
    pub async fn get_post(&self, post_id: Uuid) -> Result<PostDetail> {
        let post = self.require_post(post_id).await?;
        let discussion = self.augmenter.load([&post]).await?;
        Ok(detail(post, &discussion))
    }

    /// All posts of an author, newest first.
    pub async fn posts_by_author(&self, author_id: Uuid) -> Result<Vec<PostDetail>> {
        let posts = self.posts.posts_by_author(author_id).await?;
        let discussion = self.augmenter.load(posts.iter()).await?;
        Ok(posts
            .into_iter()
            .map(|post| detail(post, &discussion))
            .collect())
    }

    /// Delete a post; only its author may do so.
    pub async fn delete_post(&self, post_id: Uuid, requester_id: Uuid) -> Result<()> {
        let post = self.require_post(post_id).await?;
        if post.author_id != requester_id {
            return Err(AppError::Forbidden(
                "You can only delete your own posts".to_string(),
            ));
        }

        if !self.posts.delete_post(post_id).await? {
            return Err(AppError::NotFound(format!("Post {} not found", post_id)));
        }

        info!(post_id = %post_id, "post deleted");
        Ok(())
    }

    pub async fn like_post(&self, post_id: Uuid, user_id: Uuid) -> Result<()> {
        self.require_post(post_id).await?;
        if !self.posts.add_like(post_id, user_id).await? {
            return Err(AppError::BadRequest("Post already liked".to_string()));
        }
        Ok(())
    }

    pub async fn unlike_post(&self, post_id: Uuid, user_id: Uuid) -> Result<()> {
        self.require_post(post_id).await?;
        if !self.posts.remove_like(post_id, user_id).await? {
            return Err(AppError::BadRequest("Post not liked yet".to_string()));
        }
        Ok(())
    }

    async fn require_post(&self, post_id: Uuid) -> Result<Post> {
        self.posts
            .find_post(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))
    }
}

fn detail(post: Post, discussion: &Discussion) -> PostDetail {
    PostDetail {
        author: discussion.author(post.author_id),
        comments: discussion.comments_for(post.id),
        like_count: post.like_count(),
        post,
    }
}
