#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use mood_feed_service::db::InMemoryStore;
use mood_feed_service::models::{Comment, Mood, Post, User};
use mood_feed_service::services::{FeedSettings, MoodFeedService, PostService};

/// Seeded in-memory world with a fixed clock.
pub struct Fixture {
    pub store: Arc<InMemoryStore>,
    pub now: DateTime<Utc>,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryStore::new()),
            now: Utc::now(),
        }
    }

    pub async fn user(&self, name: &str, mood: Mood) -> Uuid {
        self.user_with_login(name, mood, Some(self.now - Duration::hours(1)))
            .await
    }

    pub async fn user_with_login(
        &self,
        name: &str,
        mood: Mood,
        last_login: Option<DateTime<Utc>>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.store
            .insert_user(User {
                id,
                username: name.to_string(),
                profile_picture: format!("/uploads/{}.png", name),
                current_mood: mood,
                last_login,
                points: 0,
            })
            .await;
        id
    }

    pub async fn follow(&self, follower: Uuid, followee: Uuid) {
        self.store.follow(follower, followee).await;
    }

    /// Post created `minutes_ago` before the fixture clock, liked by
    /// `like_count` fresh users.
    pub async fn post(&self, author: Uuid, mood: Mood, like_count: usize, minutes_ago: i64) -> Post {
        let likes = (0..like_count).map(|_| Uuid::new_v4()).collect();
        self.post_liked_by(author, mood, likes, minutes_ago).await
    }

    pub async fn post_liked_by(
        &self,
        author: Uuid,
        mood: Mood,
        likes: Vec<Uuid>,
        minutes_ago: i64,
    ) -> Post {
        let post = Post {
            id: Uuid::new_v4(),
            author_id: author,
            description: Some(format!("{} thoughts", mood)),
            image: None,
            mood,
            likes,
            created_at: self.now - Duration::minutes(minutes_ago),
        };
        self.store.seed_post(post.clone()).await;
        post
    }

    pub async fn comment(&self, post_id: Uuid, author: Uuid, content: &str, minutes_ago: i64) {
        self.store
            .insert_comment(Comment {
                id: Uuid::new_v4(),
                post_id,
                author_id: author,
                content: content.to_string(),
                created_at: self.now - Duration::minutes(minutes_ago),
            })
            .await;
    }

    pub fn feed(&self) -> MoodFeedService {
        MoodFeedService::new(
            self.store.clone(),
            self.store.clone(),
            self.store.clone(),
            self.store.clone(),
            FeedSettings::default(),
        )
    }

    pub fn posts(&self) -> PostService {
        PostService::new(
            self.store.clone(),
            self.store.clone(),
            self.store.clone(),
            self.store.clone(),
        )
    }
}
