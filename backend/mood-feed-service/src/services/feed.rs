use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::db::{CommentStore, LikeIndex, PostStore, UserLookup};
use crate::error::{AppError, Result};
use crate::metrics::feed::{
    FEED_INSPIRATION_POSTS_TOTAL, FEED_REQUESTS_TOTAL, FEED_REQUEST_DURATION_SECONDS,
};
use crate::models::{FeedPost, FeedResponse, FeedSource, Mood, Post};
use crate::services::augmentation::{Augmenter, Discussion, InspirationRule};
use crate::services::mood_ranking::{Affinity, FeedPolicy};
use crate::services::pagination::{PageLimits, PageRequest};

/// Tunables of the feed pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedSettings {
    pub limits: PageLimits,
    pub inspiration: InspirationRule,
}

/// Ranked, paginated, augmented feed for one viewer.
///
/// Reads are the only side effect; nothing here mutates users or posts.
pub struct MoodFeedService {
    users: Arc<dyn UserLookup>,
    likes: Arc<dyn LikeIndex>,
    posts: Arc<dyn PostStore>,
    augmenter: Augmenter,
    settings: FeedSettings,
}

impl MoodFeedService {
    pub fn new(
        users: Arc<dyn UserLookup>,
        likes: Arc<dyn LikeIndex>,
        posts: Arc<dyn PostStore>,
        comments: Arc<dyn CommentStore>,
        settings: FeedSettings,
    ) -> Self {
        Self {
            augmenter: Augmenter::new(users.clone(), comments),
            users,
            likes,
            posts,
            settings,
        }
    }

    pub fn settings(&self) -> &FeedSettings {
        &self.settings
    }

    pub async fn get_feed(&self, user_id: Uuid, page: PageRequest) -> Result<FeedResponse> {
        self.get_feed_at(user_id, page, Utc::now()).await
    }

    /// Same as [`get_feed`](Self::get_feed) with an explicit clock for the
    /// inspiration rule.
    pub async fn get_feed_at(
        &self,
        user_id: Uuid,
        page: PageRequest,
        now: DateTime<Utc>,
    ) -> Result<FeedResponse> {
        let start = Instant::now();
        let mut viewer_mood = None;

        let result = self.assemble(user_id, page, now, &mut viewer_mood).await;

        let mood = viewer_mood.map_or("unknown", |m: Mood| m.as_str());
        FEED_REQUESTS_TOTAL
            .with_label_values(&[mood, outcome(&result)])
            .inc();
        FEED_REQUEST_DURATION_SECONDS
            .with_label_values(&[mood])
            .observe(start.elapsed().as_secs_f64());

        result
    }

    async fn assemble(
        &self,
        user_id: Uuid,
        page: PageRequest,
        now: DateTime<Utc>,
        viewer_mood: &mut Option<Mood>,
    ) -> Result<FeedResponse> {
        let user = self
            .users
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
        let mood = user.current_mood;
        *viewer_mood = Some(mood);

        let (followings, liked_post_ids) = tokio::try_join!(
            self.users.get_followings(user_id),
            self.likes.get_liked_post_ids(user_id),
        )?;

        let policy = FeedPolicy::for_mood(mood, Affinity::new(followings, liked_post_ids));

        let (ranked, total_posts) = self
            .posts
            .query_posts(&policy.filter, &policy.sort, page.skip(), page.page_size())
            .await?;

        let inspiration = if self.settings.inspiration.applies(&user, page, now) {
            self.inspiration_posts(&ranked).await?
        } else {
            Vec::new()
        };

        let discussion = self
            .augmenter
            .load(ranked.iter().chain(inspiration.iter()))
            .await?;

        let inspiration_count = inspiration.len();
        let posts: Vec<FeedPost> = ranked
            .into_iter()
            .map(|post| feed_post(post, FeedSource::Ranked, &policy, &discussion))
            .chain(
                inspiration
                    .into_iter()
                    .map(|post| feed_post(post, FeedSource::Inspiration, &policy, &discussion)),
            )
            .collect();

        FEED_INSPIRATION_POSTS_TOTAL.inc_by(inspiration_count as u64);

        debug!(
            user_id = %user_id,
            mood = %mood,
            page = page.page(),
            page_size = page.page_size(),
            returned = posts.len(),
            total_posts,
            inspiration = inspiration_count,
            "mood feed assembled"
        );

        Ok(FeedResponse {
            posts,
            total_posts,
            current_page: page.page(),
            total_pages: page.total_pages(total_posts),
        })
    }

    /// Most-liked happy posts that are not already on the page.
    async fn inspiration_posts(&self, page_posts: &[Post]) -> Result<Vec<Post>> {
        let limit = self.settings.inspiration.limit;
        let on_page: HashSet<Uuid> = page_posts.iter().map(|p| p.id).collect();

        let mut picked = self
            .posts
            .query_top_liked(Mood::Happy, on_page.iter().copied().collect(), limit)
            .await?;

        let mut seen = on_page;
        picked.retain(|p| seen.insert(p.id));
        picked.truncate(limit);

        Ok(picked)
    }
}

/// Metric label for how a feed request ended.
fn outcome(result: &Result<FeedResponse>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(AppError::NotFound(_)) => "not_found",
        Err(e) if e.is_transient() => "unavailable",
        Err(_) => "error",
    }
}

fn feed_post(
    post: Post,
    source: FeedSource,
    policy: &FeedPolicy,
    discussion: &Discussion,
) -> FeedPost {
    FeedPost {
        author: discussion.author(post.author_id),
        comments: discussion.comments_for(post.id),
        like_count: post.like_count(),
        score: policy.explain(&post),
        source,
        post,
    }
}
