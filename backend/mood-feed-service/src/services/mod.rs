/// Business logic layer for mood-feed-service
///
/// - Mood ranking: per-mood eligibility filter and priority order
/// - Pagination: tolerant page arithmetic
/// - Augmentation: comments, authors and inspiration posts
/// - Feed: the query facade tying the above to the stores
/// - Posts: write paths that feed the ranking inputs
pub mod augmentation;
pub mod feed;
pub mod mood_ranking;
pub mod pagination;
pub mod posts;

pub use feed::{FeedSettings, MoodFeedService};
pub use posts::PostService;
