use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::{UserLookup, UserRepository};
use crate::error::Result;
use crate::models::{AuthorSummary, Mood, User};

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    profile_picture: String,
    current_mood: Option<String>,
    last_login: Option<DateTime<Utc>>,
    points: i64,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            profile_picture: row.profile_picture,
            current_mood: Mood::from_stored(row.current_mood.as_deref()),
            last_login: row.last_login,
            points: row.points,
        }
    }
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserLookup for PgUserStore {
    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, profile_picture, current_mood, last_login, points
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn get_followings(&self, user_id: Uuid) -> Result<HashSet<Uuid>> {
        let ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT followee_id FROM user_follows WHERE follower_id = $1")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(ids.into_iter().collect())
    }

    async fn get_profiles(&self, user_ids: Vec<Uuid>) -> Result<HashMap<Uuid, AuthorSummary>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(Uuid, String, String)> = sqlx::query_as(
            "SELECT id, username, profile_picture FROM users WHERE id = ANY($1)",
        )
        .bind(&user_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, username, profile_picture)| {
                (
                    id,
                    AuthorSummary {
                        id,
                        username,
                        profile_picture,
                    },
                )
            })
            .collect())
    }
}

#[async_trait]
impl UserRepository for PgUserStore {
    async fn update_mood(&self, user_id: Uuid, mood: Mood) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET current_mood = $1 WHERE id = $2")
            .bind(mood.as_str())
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_points(&self, user_id: Uuid, points: i64) -> Result<()> {
        sqlx::query("UPDATE users SET points = points + $1 WHERE id = $2")
            .bind(points)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
