use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

use super::{LikeIndex, PostRepository, PostStore};
use crate::error::Result;
use crate::models::{Mood, NewPost, Post};
use crate::services::mood_ranking::{FeedSort, PostFilter};

/// Posts with their mood normalized and their like set aggregated.
/// Unknown stored moods read as neutral, matching `Mood::from_stored`.
const POST_CANDIDATES: &str = r#"
    SELECT p.id, p.author_id, p.description, p.image,
           CASE WHEN p.mood IN ('happy', 'sad', 'excited') THEN p.mood ELSE 'neutral' END AS mood,
           p.created_at,
           COALESCE(array_agg(l.user_id) FILTER (WHERE l.user_id IS NOT NULL), '{}'::uuid[]) AS likes
    FROM posts p
    LEFT JOIN post_likes l ON l.post_id = p.id
    GROUP BY p.id
"#;

/// Feed eligibility and score. Binds:
/// $1 viewer mood (NULL for recency order), $2 followed authors, $3 liked posts,
/// $4 excluded moods, $5 unrestricted flag, $6 required moods,
/// $7 required authors, $8 required post ids.
const FEED_RANKED: &str = r#"
    SELECT c.*,
           CASE WHEN $1::text IS NULL THEN 0
                ELSE (CASE WHEN c.mood = $1::text THEN 1000 ELSE 0 END)
                   + (CASE WHEN c.author_id = ANY($2) THEN 500 ELSE 0 END)
                   + (CASE WHEN c.id = ANY($3) THEN 250 ELSE 0 END)
                   + cardinality(c.likes)
           END AS score_tenths
    FROM candidates c
    WHERE NOT (c.mood = ANY($4))
      AND ($5 OR c.mood = ANY($6) OR c.author_id = ANY($7) OR c.id = ANY($8))
"#;

#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    author_id: Uuid,
    description: Option<String>,
    image: Option<String>,
    mood: Option<String>,
    created_at: DateTime<Utc>,
    likes: Vec<Uuid>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            author_id: row.author_id,
            description: row.description,
            image: row.image,
            mood: Mood::from_stored(row.mood.as_deref()),
            likes: row.likes,
            created_at: row.created_at,
        }
    }
}

/// Query parameters derived from a filter/sort pair.
struct FeedBinds {
    viewer_mood: Option<&'static str>,
    score_authors: Vec<Uuid>,
    score_posts: Vec<Uuid>,
    excluded_moods: Vec<String>,
    unrestricted: bool,
    required_moods: Vec<String>,
    required_authors: Vec<Uuid>,
    required_posts: Vec<Uuid>,
}

impl FeedBinds {
    fn new(filter: &PostFilter, sort: &FeedSort) -> Self {
        let (viewer_mood, score_authors, score_posts) = match sort {
            FeedSort::Recency => (None, Vec::new(), Vec::new()),
            FeedSort::Weighted { mood, affinity } => (
                Some(mood.as_str()),
                affinity.followings.iter().copied().collect(),
                affinity.liked_post_ids.iter().copied().collect(),
            ),
        };

        let (unrestricted, required_moods, required_authors, required_posts) =
            match &filter.require_any {
                None => (true, Vec::new(), Vec::new(), Vec::new()),
                Some(signals) => (
                    false,
                    mood_names(&signals.moods),
                    signals.affinity.followings.iter().copied().collect(),
                    signals.affinity.liked_post_ids.iter().copied().collect(),
                ),
            };

        Self {
            viewer_mood,
            score_authors,
            score_posts,
            excluded_moods: mood_names(&filter.excluded_moods),
            unrestricted,
            required_moods,
            required_authors,
            required_posts,
        }
    }
}

/// LIMIT/OFFSET value; anything past `i64::MAX` simply selects nothing.
fn sql_bound(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn mood_names(moods: &[Mood]) -> Vec<String> {
    moods.iter().map(|m| m.as_str().to_string()).collect()
}

/// PostgreSQL-backed post store.
#[derive(Clone)]
pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn query_posts(
        &self,
        filter: &PostFilter,
        sort: &FeedSort,
        skip: usize,
        limit: usize,
    ) -> Result<(Vec<Post>, usize)> {
        let binds = FeedBinds::new(filter, sort);

        let page_sql = format!(
            "WITH candidates AS ({POST_CANDIDATES}), ranked AS ({FEED_RANKED})
             SELECT id, author_id, description, image, mood, created_at, likes
             FROM ranked
             ORDER BY score_tenths DESC, created_at DESC, id DESC
             LIMIT $9 OFFSET $10"
        );
        let count_sql = format!(
            "WITH candidates AS ({POST_CANDIDATES}), ranked AS ({FEED_RANKED})
             SELECT COUNT(*) FROM ranked"
        );

        // Page and total must come from the same snapshot.
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let rows = sqlx::query_as::<_, PostRow>(&page_sql)
            .bind(binds.viewer_mood)
            .bind(&binds.score_authors)
            .bind(&binds.score_posts)
            .bind(&binds.excluded_moods)
            .bind(binds.unrestricted)
            .bind(&binds.required_moods)
            .bind(&binds.required_authors)
            .bind(&binds.required_posts)
            .bind(sql_bound(limit))
            .bind(sql_bound(skip))
            .fetch_all(&mut *tx)
            .await?;

        // Unused score binds still have to be sent so that $1..$8 line up.
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(binds.viewer_mood)
            .bind(&binds.score_authors)
            .bind(&binds.score_posts)
            .bind(&binds.excluded_moods)
            .bind(binds.unrestricted)
            .bind(&binds.required_moods)
            .bind(&binds.required_authors)
            .bind(&binds.required_posts)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(
            rows = rows.len(),
            total, skip, limit, "feed query completed"
        );

        Ok((rows.into_iter().map(Post::from).collect(), total.max(0) as usize))
    }

    async fn query_top_liked(
        &self,
        mood: Mood,
        exclude_ids: Vec<Uuid>,
        limit: usize,
    ) -> Result<Vec<Post>> {
        let sql = format!(
            "WITH candidates AS ({POST_CANDIDATES})
             SELECT id, author_id, description, image, mood, created_at, likes
             FROM candidates
             WHERE mood = $1 AND NOT (id = ANY($2))
             ORDER BY cardinality(likes) DESC, created_at DESC, id DESC
             LIMIT $3"
        );

        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(mood.as_str())
            .bind(&exclude_ids)
            .bind(sql_bound(limit))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Post::from).collect())
    }
}

#[async_trait]
impl LikeIndex for PgPostStore {
    async fn get_liked_post_ids(&self, user_id: Uuid) -> Result<HashSet<Uuid>> {
        let ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT post_id FROM post_likes WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(ids.into_iter().collect())
    }
}

#[async_trait]
impl PostRepository for PgPostStore {
    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        let sql = format!(
            "WITH candidates AS ({POST_CANDIDATES})
             SELECT id, author_id, description, image, mood, created_at, likes
             FROM candidates
             WHERE id = $1"
        );

        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Post::from))
    }

    async fn posts_by_author(&self, author_id: Uuid) -> Result<Vec<Post>> {
        let sql = format!(
            "WITH candidates AS ({POST_CANDIDATES})
             SELECT id, author_id, description, image, mood, created_at, likes
             FROM candidates
             WHERE author_id = $1
             ORDER BY created_at DESC, id DESC"
        );

        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(author_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn insert_post(&self, new_post: NewPost) -> Result<Post> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            INSERT INTO posts (author_id, description, image, mood)
            VALUES ($1, $2, $3, $4)
            RETURNING id, author_id, description, image, mood, created_at,
                      '{}'::uuid[] AS likes
            "#,
        )
        .bind(new_post.author_id)
        .bind(new_post.description.as_deref())
        .bind(new_post.image.as_deref())
        .bind(new_post.mood.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn delete_post(&self, post_id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM comments WHERE post_id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM post_likes WHERE post_id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO post_likes (post_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (post_id, user_id) DO NOTHING
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
