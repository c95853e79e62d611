//! Post decoration shared by the feed and the post endpoints: comments,
//! author summaries, and the inspiration rule for sad returning users.

use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{CommentStore, UserLookup};
use crate::error::Result;
use crate::models::{AuthorSummary, Comment, CommentView, Mood, Post, User};
use crate::services::pagination::PageRequest;

/// When and how many happy posts are appended to a sad user's first page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InspirationRule {
    /// Minimum time since the last login.
    pub absent_for: Duration,
    pub limit: usize,
}

impl Default for InspirationRule {
    fn default() -> Self {
        Self {
            absent_for: Duration::days(3),
            limit: 2,
        }
    }
}

impl InspirationRule {
    /// A user with no recorded login never qualifies.
    pub fn applies(&self, user: &User, page: PageRequest, now: DateTime<Utc>) -> bool {
        if self.limit == 0 || !page.is_first() || user.current_mood != Mood::Sad {
            return false;
        }

        match user.last_login {
            Some(last_login) => now - last_login > self.absent_for,
            None => false,
        }
    }
}

/// Comments and author profiles loaded for a batch of posts.
#[derive(Debug, Default)]
pub struct Discussion {
    comments: HashMap<Uuid, Vec<Comment>>,
    profiles: HashMap<Uuid, AuthorSummary>,
}

impl Discussion {
    pub fn author(&self, user_id: Uuid) -> Option<AuthorSummary> {
        self.profiles.get(&user_id).cloned()
    }

    /// Newest first; empty when the post has no comments.
    pub fn comments_for(&self, post_id: Uuid) -> Vec<CommentView> {
        self.comments
            .get(&post_id)
            .map(|comments| {
                comments
                    .iter()
                    .map(|comment| CommentView {
                        comment: comment.clone(),
                        author: self.author(comment.author_id),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Loads the discussion around posts with one comment query and one
/// profile query per batch.
#[derive(Clone)]
pub struct Augmenter {
    users: Arc<dyn UserLookup>,
    comments: Arc<dyn CommentStore>,
}

impl Augmenter {
    pub fn new(users: Arc<dyn UserLookup>, comments: Arc<dyn CommentStore>) -> Self {
        Self { users, comments }
    }

    pub async fn load<'a, I>(&self, posts: I) -> Result<Discussion>
    where
        I: IntoIterator<Item = &'a Post>,
    {
        let mut post_ids = Vec::new();
        let mut author_ids = HashSet::new();
        for post in posts {
            post_ids.push(post.id);
            author_ids.insert(post.author_id);
        }

        if post_ids.is_empty() {
            return Ok(Discussion::default());
        }

        let comments = self.comments.comments_for_posts(post_ids).await?;
        author_ids.extend(comments.values().flatten().map(|c| c.author_id));

        let profiles = self
            .users
            .get_profiles(author_ids.into_iter().collect())
            .await?;

        Ok(Discussion { comments, profiles })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MockCommentStore, MockUserLookup};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap()
    }

    fn user(mood: Mood, last_login: Option<DateTime<Utc>>) -> User {
        User {
            id: Uuid::new_v4(),
            username: "reader".to_string(),
            profile_picture: String::new(),
            current_mood: mood,
            last_login,
            points: 0,
        }
    }

    #[test]
    fn inspiration_requires_sad_absent_user_on_first_page() {
        let rule = InspirationRule::default();
        let absent = Some(now() - Duration::days(5));
        let first = PageRequest::new(1, 5);

        assert!(rule.applies(&user(Mood::Sad, absent), first, now()));
        assert!(!rule.applies(&user(Mood::Happy, absent), first, now()));
        assert!(!rule.applies(&user(Mood::Sad, absent), PageRequest::new(2, 5), now()));
        assert!(!rule.applies(&user(Mood::Sad, None), first, now()));
    }

    #[test]
    fn inspiration_threshold_is_strict() {
        let rule = InspirationRule::default();
        let first = PageRequest::new(1, 5);

        let exactly_three_days = user(Mood::Sad, Some(now() - Duration::days(3)));
        let just_over = user(
            Mood::Sad,
            Some(now() - Duration::days(3) - Duration::seconds(1)),
        );

        assert!(!rule.applies(&exactly_three_days, first, now()));
        assert!(rule.applies(&just_over, first, now()));
    }

    #[tokio::test]
    async fn empty_batch_skips_store_calls() {
        let mut users = MockUserLookup::new();
        users.expect_get_profiles().times(0);
        let mut comments = MockCommentStore::new();
        comments.expect_comments_for_posts().times(0);

        let augmenter = Augmenter::new(Arc::new(users), Arc::new(comments));
        let discussion = augmenter.load(std::iter::empty()).await.unwrap();

        assert!(discussion.comments_for(Uuid::new_v4()).is_empty());
    }

    #[tokio::test]
    async fn comment_authors_are_resolved_with_post_authors() {
        let post_author = Uuid::new_v4();
        let commenter = Uuid::new_v4();
        let post = Post {
            id: Uuid::new_v4(),
            author_id: post_author,
            description: Some("sunrise".to_string()),
            image: None,
            mood: Mood::Happy,
            likes: Vec::new(),
            created_at: now(),
        };
        let comment = Comment {
            id: Uuid::new_v4(),
            post_id: post.id,
            author_id: commenter,
            content: "lovely".to_string(),
            created_at: now(),
        };

        let mut comments = MockCommentStore::new();
        let grouped = HashMap::from([(post.id, vec![comment.clone()])]);
        comments
            .expect_comments_for_posts()
            .times(1)
            .returning(move |_| Ok(grouped.clone()));

        let mut users = MockUserLookup::new();
        users
            .expect_get_profiles()
            .withf(move |ids| ids.contains(&post_author) && ids.contains(&commenter))
            .times(1)
            .returning(move |_| {
                Ok(HashMap::from([(
                    commenter,
                    AuthorSummary {
                        id: commenter,
                        username: "friend".to_string(),
                        profile_picture: String::new(),
                    },
                )]))
            });

        let augmenter = Augmenter::new(Arc::new(users), Arc::new(comments));
        let discussion = augmenter.load([&post]).await.unwrap();

        assert!(discussion.author(post_author).is_none());
        let views = discussion.comments_for(post.id);
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].author.as_ref().unwrap().username, "friend");
    }
}
