use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, HistogramVec,
    IntCounter, IntCounterVec,
};

lazy_static! {
    /// Feed requests by viewer mood and outcome. Mood is `unknown` when the
    /// viewer could not be loaded.
    pub static ref FEED_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "mood_feed_requests_total",
        "Total mood feed requests segmented by viewer mood and outcome",
        &["mood", "outcome"]
    )
    .expect("failed to register mood_feed_requests_total");

    /// Time spent assembling a feed page, by the viewer's mood.
    pub static ref FEED_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "mood_feed_request_duration_seconds",
        "Mood feed request duration segmented by viewer mood",
        &["mood"]
    )
    .expect("failed to register mood_feed_request_duration_seconds");

    /// Happy posts appended for sad, long-absent viewers.
    pub static ref FEED_INSPIRATION_POSTS_TOTAL: IntCounter = register_int_counter!(
        "mood_feed_inspiration_posts_total",
        "Inspiration posts appended to first feed pages"
    )
    .expect("failed to register mood_feed_inspiration_posts_total");
}
