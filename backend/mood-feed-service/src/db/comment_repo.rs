use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use super::CommentStore;
use crate::error::Result;
use crate::models::Comment;

#[derive(Clone)]
pub struct PgCommentStore {
    pool: PgPool,
}

impl PgCommentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentStore for PgCommentStore {
    async fn comments_for_posts(&self, post_ids: Vec<Uuid>) -> Result<HashMap<Uuid, Vec<Comment>>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, (Uuid, Uuid, Uuid, String, chrono::DateTime<chrono::Utc>)>(
            r#"
            SELECT id, post_id, author_id, content, created_at
            FROM comments
            WHERE post_id = ANY($1)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(&post_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<Comment>> = HashMap::new();
        for (id, post_id, author_id, content, created_at) in rows {
            grouped.entry(post_id).or_default().push(Comment {
                id,
                post_id,
                author_id,
                content,
                created_at,
            });
        }

        Ok(grouped)
    }
}
