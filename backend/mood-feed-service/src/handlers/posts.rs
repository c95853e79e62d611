/// Post handlers - HTTP endpoints for post operations
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::middleware::UserId;
use crate::models::Mood;
use crate::services::PostService;

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub description: Option<String>,
    pub image: Option<String>,
    pub mood: Option<String>,
}

impl CreatePostRequest {
    /// Omitted mood means neutral; anything else must be a known mood.
    fn mood(&self) -> Result<Mood> {
        match self.mood.as_deref() {
            None => Ok(Mood::default()),
            Some(raw) => raw
                .parse::<Mood>()
                .map_err(|e| AppError::ValidationError(e.to_string())),
        }
    }
}

pub struct PostHandlerState {
    pub posts: Arc<PostService>,
}

/// Create a new post
pub async fn create_post(
    state: web::Data<PostHandlerState>,
    user_id: UserId,
    req: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    let mood = req.mood()?;
    let post = state
        .posts
        .create_post(user_id.0, req.description, req.image, mood)
        .await?;

    Ok(HttpResponse::Created().json(post))
}

/// Get a post with its comments
pub async fn get_post(
    state: web::Data<PostHandlerState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let post = state.posts.get_post(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// Get all posts of a user
pub async fn get_user_posts(
    state: web::Data<PostHandlerState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let posts = state.posts.posts_by_author(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// Delete a post (author only)
pub async fn delete_post(
    state: web::Data<PostHandlerState>,
    user_id: UserId,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    state.posts.delete_post(path.into_inner(), user_id.0).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn like_post(
    state: web::Data<PostHandlerState>,
    user_id: UserId,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    state.posts.like_post(path.into_inner(), user_id.0).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "liked": true })))
}

pub async fn unlike_post(
    state: web::Data<PostHandlerState>,
    user_id: UserId,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    state.posts.unlike_post(path.into_inner(), user_id.0).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "liked": false })))
}
