use actix_web::{web, HttpResponse};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{AppError, Result};
use crate::middleware::UserId;
use crate::services::pagination::PageRequest;
use crate::services::MoodFeedService;

/// Raw query values; malformed numbers fall back to defaults instead of
/// failing the request.
#[derive(Debug, Default, Deserialize)]
pub struct FeedQueryParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl FeedQueryParams {
    pub(crate) fn page_request(&self, feed: &MoodFeedService) -> PageRequest {
        PageRequest::from_raw(
            self.page.as_deref(),
            self.limit.as_deref(),
            feed.settings().limits,
        )
    }
}

pub struct FeedHandlerState {
    pub feed: Arc<MoodFeedService>,
    pub request_timeout: Duration,
}

/// GET /api/v1/feed
pub async fn get_feed(
    query: web::Query<FeedQueryParams>,
    user_id: UserId,
    state: web::Data<FeedHandlerState>,
) -> Result<HttpResponse> {
    serve_feed(&query, user_id, &state).await
}

/// GET /api/v1/posts/mood/{mood}
///
/// The path segment is kept for older clients; the stored mood always wins.
pub async fn get_feed_by_mood(
    path: web::Path<String>,
    query: web::Query<FeedQueryParams>,
    user_id: UserId,
    state: web::Data<FeedHandlerState>,
) -> Result<HttpResponse> {
    debug!(requested_mood = %path.as_str(), "legacy mood feed route");
    serve_feed(&query, user_id, &state).await
}

async fn serve_feed(
    query: &FeedQueryParams,
    user_id: UserId,
    state: &FeedHandlerState,
) -> Result<HttpResponse> {
    let page = query.page_request(&state.feed);

    debug!(
        "Feed request: user={} page={} limit={}",
        user_id.0,
        page.page(),
        page.page_size()
    );

    let feed = tokio::time::timeout(state.request_timeout, state.feed.get_feed(user_id.0, page))
        .await
        .map_err(|_| {
            warn!("Feed request for user {} exceeded its deadline", user_id.0);
            AppError::Timeout(format!(
                "Feed not ready within {} ms",
                state.request_timeout.as_millis()
            ))
        })??;

    Ok(HttpResponse::Ok().json(feed))
}
