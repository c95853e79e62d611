//! Mood-aware feed ranking
//!
//! Turns the viewer's mood, follow graph and like history into a
//! [`FeedPolicy`]: a filter deciding which posts are eligible and a sort
//! deciding their order. The policy is plain data so that any post store can
//! evaluate it; [`PostFilter::matches`] and [`FeedSort::compare`] are the
//! reference semantics every store must reproduce.
//!
//! | Viewer mood     | Eligible posts                                              | Order    |
//! |-----------------|-------------------------------------------------------------|----------|
//! | happy / excited | not sad; uplifting, neutral, followed author or liked post  | weighted |
//! | sad             | not sad or neutral; uplifting, followed author or liked post | weighted |
//! | neutral         | everything                                                  | recency  |
//!
//! Weighted score:
//! `100·[mood match] + 50·[followed author] + 25·[liked before] + 0.1·likes`,
//! ties broken by newest first, then by post id.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;
use uuid::Uuid;

use crate::models::{Mood, Post};

// Weights are kept in tenths of a point so that scores stay exact integers.
const MOOD_MATCH_TENTHS: u64 = 1_000;
const FOLLOWED_AUTHOR_TENTHS: u64 = 500;
const LIKED_BEFORE_TENTHS: u64 = 250;
const PER_LIKE_TENTHS: u64 = 1;

/// Social signals of the viewer, read once per request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Affinity {
    pub followings: HashSet<Uuid>,
    pub liked_post_ids: HashSet<Uuid>,
}

impl Affinity {
    pub fn new(followings: HashSet<Uuid>, liked_post_ids: HashSet<Uuid>) -> Self {
        Self {
            followings,
            liked_post_ids,
        }
    }

    pub fn follows(&self, author_id: Uuid) -> bool {
        self.followings.contains(&author_id)
    }

    pub fn liked(&self, post_id: Uuid) -> bool {
        self.liked_post_ids.contains(&post_id)
    }
}

/// Eligibility rule for feed candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostFilter {
    /// Posts carrying one of these moods never appear.
    pub excluded_moods: Vec<Mood>,
    /// When present, a post must satisfy at least one of its signals.
    pub require_any: Option<RequiredSignals>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredSignals {
    pub moods: Vec<Mood>,
    pub affinity: Affinity,
}

impl PostFilter {
    /// Admits every post.
    pub fn unrestricted() -> Self {
        Self {
            excluded_moods: Vec::new(),
            require_any: None,
        }
    }

    pub fn matches(&self, post: &Post) -> bool {
        if self.excluded_moods.contains(&post.mood) {
            return false;
        }

        match &self.require_any {
            None => true,
            Some(signals) => {
                signals.moods.contains(&post.mood)
                    || signals.affinity.follows(post.author_id)
                    || signals.affinity.liked(post.id)
            }
        }
    }
}

/// Ordering of eligible posts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSort {
    /// Newest first.
    Recency,
    /// Highest priority score first, newest first on ties.
    Weighted { mood: Mood, affinity: Affinity },
}

impl FeedSort {
    /// Total order over posts; equal only for the same post id.
    pub fn compare(&self, a: &Post, b: &Post) -> Ordering {
        let by_score = match self {
            FeedSort::Recency => Ordering::Equal,
            FeedSort::Weighted { mood, affinity } => {
                let score_a = ScoreBreakdown::compute(*mood, affinity, a).tenths();
                let score_b = ScoreBreakdown::compute(*mood, affinity, b).tenths();
                score_b.cmp(&score_a)
            }
        };

        by_score
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| b.id.cmp(&a.id))
    }
}

/// The named terms of a post's priority score.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub mood_match: bool,
    pub followed_author: bool,
    pub liked_before: bool,
    pub like_count: usize,
    pub total: f64,
}

impl ScoreBreakdown {
    pub fn compute(viewer_mood: Mood, affinity: &Affinity, post: &Post) -> Self {
        let mut breakdown = Self {
            mood_match: post.mood == viewer_mood,
            followed_author: affinity.follows(post.author_id),
            liked_before: affinity.liked(post.id),
            like_count: post.like_count(),
            total: 0.0,
        };
        breakdown.total = breakdown.tenths() as f64 / 10.0;
        breakdown
    }

    /// Exact score in tenths of a point.
    pub fn tenths(&self) -> u64 {
        let mut tenths = self.like_count as u64 * PER_LIKE_TENTHS;
        if self.mood_match {
            tenths += MOOD_MATCH_TENTHS;
        }
        if self.followed_author {
            tenths += FOLLOWED_AUTHOR_TENTHS;
        }
        if self.liked_before {
            tenths += LIKED_BEFORE_TENTHS;
        }
        tenths
    }
}

/// Filter and order selected for one viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedPolicy {
    pub mood: Mood,
    pub filter: PostFilter,
    pub sort: FeedSort,
}

impl FeedPolicy {
    pub fn for_mood(mood: Mood, affinity: Affinity) -> Self {
        match mood {
            Mood::Happy | Mood::Excited => Self {
                mood,
                filter: PostFilter {
                    excluded_moods: vec![Mood::Sad],
                    require_any: Some(RequiredSignals {
                        moods: vec![Mood::Happy, Mood::Excited, Mood::Neutral],
                        affinity: affinity.clone(),
                    }),
                },
                sort: FeedSort::Weighted { mood, affinity },
            },
            Mood::Sad => Self {
                mood,
                filter: PostFilter {
                    excluded_moods: vec![Mood::Sad, Mood::Neutral],
                    require_any: Some(RequiredSignals {
                        moods: vec![Mood::Happy, Mood::Excited],
                        affinity: affinity.clone(),
                    }),
                },
                sort: FeedSort::Weighted { mood, affinity },
            },
            Mood::Neutral => Self {
                mood,
                filter: PostFilter::unrestricted(),
                sort: FeedSort::Recency,
            },
        }
    }

    pub fn admits(&self, post: &Post) -> bool {
        self.filter.matches(post)
    }

    /// Score terms for a post, or `None` when the feed is recency-ordered.
    pub fn explain(&self, post: &Post) -> Option<ScoreBreakdown> {
        match &self.sort {
            FeedSort::Recency => None,
            FeedSort::Weighted { mood, affinity } => {
                Some(ScoreBreakdown::compute(*mood, affinity, post))
            }
        }
    }

    /// Filters and orders a candidate set in memory.
    pub fn rank<I>(&self, posts: I) -> Vec<Post>
    where
        I: IntoIterator<Item = Post>,
    {
        let mut eligible: Vec<Post> = posts.into_iter().filter(|p| self.admits(p)).collect();
        eligible.sort_by(|a, b| self.sort.compare(a, b));
        eligible
    }
}
