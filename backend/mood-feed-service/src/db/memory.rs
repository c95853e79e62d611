//! In-process store implementing every repository trait.
//!
//! Evaluates feed queries with `PostFilter::matches` / `FeedSort::compare`
//! directly. Backs the integration tests.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CommentStore, LikeIndex, PostRepository, PostStore, UserLookup, UserRepository};
use crate::error::{AppError, Result};
use crate::models::{AuthorSummary, Comment, Mood, NewPost, Post, User};
use crate::services::mood_ranking::{FeedSort, PostFilter};

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    followings: HashMap<Uuid, HashSet<Uuid>>,
    posts: HashMap<Uuid, Post>,
    comments: Vec<Comment>,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with `StoreUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::StoreUnavailable(
                "in-memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn insert_user(&self, user: User) {
        self.state.write().await.users.insert(user.id, user);
    }

    pub async fn follow(&self, follower_id: Uuid, followee_id: Uuid) {
        self.state
            .write()
            .await
            .followings
            .entry(follower_id)
            .or_default()
            .insert(followee_id);
    }

    pub async fn seed_post(&self, post: Post) {
        self.state.write().await.posts.insert(post.id, post);
    }

    pub async fn insert_comment(&self, comment: Comment) {
        self.state.write().await.comments.push(comment);
    }

    pub async fn user(&self, user_id: Uuid) -> Option<User> {
        self.state.read().await.users.get(&user_id).cloned()
    }
}

#[async_trait]
impl UserLookup for InMemoryStore {
    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
        self.check_available()?;
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }

    async fn get_followings(&self, user_id: Uuid) -> Result<HashSet<Uuid>> {
        self.check_available()?;
        Ok(self
            .state
            .read()
            .await
            .followings
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_profiles(&self, user_ids: Vec<Uuid>) -> Result<HashMap<Uuid, AuthorSummary>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(user_ids
            .into_iter()
            .filter_map(|id| state.users.get(&id).map(|u| (id, AuthorSummary::from(u))))
            .collect())
    }
}

#[async_trait]
impl LikeIndex for InMemoryStore {
    async fn get_liked_post_ids(&self, user_id: Uuid) -> Result<HashSet<Uuid>> {
        self.check_available()?;
        Ok(self
            .state
            .read()
            .await
            .posts
            .values()
            .filter(|p| p.is_liked_by(user_id))
            .map(|p| p.id)
            .collect())
    }
}

#[async_trait]
impl PostStore for InMemoryStore {
    async fn query_posts(
        &self,
        filter: &PostFilter,
        sort: &FeedSort,
        skip: usize,
        limit: usize,
    ) -> Result<(Vec<Post>, usize)> {
        self.check_available()?;
        let state = self.state.read().await;

        let mut matching: Vec<&Post> = state.posts.values().filter(|p| filter.matches(p)).collect();
        matching.sort_by(|a, b| sort.compare(a, b));

        let total = matching.len();
        let page = matching
            .into_iter()
            .skip(skip)
            .take(limit)
            .cloned()
            .collect();

        Ok((page, total))
    }

    async fn query_top_liked(
        &self,
        mood: Mood,
        exclude_ids: Vec<Uuid>,
        limit: usize,
    ) -> Result<Vec<Post>> {
        self.check_available()?;
        let state = self.state.read().await;

        let mut candidates: Vec<&Post> = state
            .posts
            .values()
            .filter(|p| p.mood == mood && !exclude_ids.contains(&p.id))
            .collect();
        candidates.sort_by(|a, b| {
            b.like_count()
                .cmp(&a.like_count())
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(candidates.into_iter().take(limit).cloned().collect())
    }
}

#[async_trait]
impl CommentStore for InMemoryStore {
    async fn comments_for_posts(&self, post_ids: Vec<Uuid>) -> Result<HashMap<Uuid, Vec<Comment>>> {
        self.check_available()?;
        let state = self.state.read().await;

        let mut grouped: HashMap<Uuid, Vec<Comment>> = HashMap::new();
        for comment in state.comments.iter().filter(|c| post_ids.contains(&c.post_id)) {
            grouped
                .entry(comment.post_id)
                .or_default()
                .push(comment.clone());
        }
        for comments in grouped.values_mut() {
            comments.sort_by(|a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then_with(|| b.id.cmp(&a.id))
            });
        }

        Ok(grouped)
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        self.check_available()?;
        Ok(self.state.read().await.posts.get(&post_id).cloned())
    }

    async fn posts_by_author(&self, author_id: Uuid) -> Result<Vec<Post>> {
        self.check_available()?;
        let mut posts: Vec<Post> = self
            .state
            .read()
            .await
            .posts
            .values()
            .filter(|p| p.author_id == author_id)
            .cloned()
            .collect();
        posts.sort_by(|a, b| FeedSort::Recency.compare(a, b));
        Ok(posts)
    }

    async fn insert_post(&self, new_post: NewPost) -> Result<Post> {
        self.check_available()?;
        let post = Post {
            id: Uuid::new_v4(),
            author_id: new_post.author_id,
            description: new_post.description,
            image: new_post.image,
            mood: new_post.mood,
            likes: Vec::new(),
            created_at: Utc::now(),
        };
        self.state.write().await.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete_post(&self, post_id: Uuid) -> Result<bool> {
        self.check_available()?;
        let mut state = self.state.write().await;
        let removed = state.posts.remove(&post_id).is_some();
        if removed {
            state.comments.retain(|c| c.post_id != post_id);
        }
        Ok(removed)
    }

    async fn add_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool> {
        self.check_available()?;
        let mut state = self.state.write().await;
        match state.posts.get_mut(&post_id) {
            Some(post) if !post.is_liked_by(user_id) => {
                post.likes.push(user_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn remove_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool> {
        self.check_available()?;
        let mut state = self.state.write().await;
        match state.posts.get_mut(&post_id) {
            Some(post) if post.is_liked_by(user_id) => {
                post.likes.retain(|id| *id != user_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn update_mood(&self, user_id: Uuid, mood: Mood) -> Result<bool> {
        self.check_available()?;
        let mut state = self.state.write().await;
        match state.users.get_mut(&user_id) {
            Some(user) => {
                user.current_mood = mood;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn add_points(&self, user_id: Uuid, points: i64) -> Result<()> {
        self.check_available()?;
        if let Some(user) = self.state.write().await.users.get_mut(&user_id) {
            user.points += points;
        }
        Ok(())
    }
}
