use actix_web::{web, HttpResponse};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::UserId;
use crate::models::Mood;

#[derive(Debug, Deserialize)]
pub struct UpdateMoodRequest {
    pub mood: String,
}

pub struct UserHandlerState {
    pub users: Arc<dyn UserRepository>,
}

/// PUT /api/v1/users/me/mood
pub async fn update_mood(
    state: web::Data<UserHandlerState>,
    user_id: UserId,
    req: web::Json<UpdateMoodRequest>,
) -> Result<HttpResponse> {
    let mood = req
        .mood
        .parse::<Mood>()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    if !state.users.update_mood(user_id.0, mood).await? {
        return Err(AppError::NotFound(format!("User {} not found", user_id.0)));
    }

    info!(user_id = %user_id.0, mood = %mood, "mood updated");
    Ok(HttpResponse::Ok().json(serde_json::json!({ "currentMood": mood })))
}
