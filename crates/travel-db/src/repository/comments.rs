//! Comment operations

use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{CommentWithPoster, NewComment};
use crate::repository::Database;

impl Database {
    // ==================== Comment Operations ====================

    /// Insert a new comment, returning its ID
    pub async fn insert_comment(&self, comment: &NewComment) -> Result<i64, DbError> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            INSERT INTO comments (city_id, poster_id, text, created_at, modified_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(comment.city_id)
        .bind(comment.poster_id)
        .bind(&comment.text)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.get("id"))
    }

    /// Most recent comments for a city, newest first
    pub async fn latest_comments(
        &self,
        city_id: i64,
        limit: u32,
    ) -> Result<Vec<CommentWithPoster>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.city_id, c.poster_id, c.text, c.created_at, c.modified_at,
                   u.username AS poster_name
            FROM comments c
            JOIN users u ON u.id = c.poster_id
            WHERE c.city_id = ?
            ORDER BY c.created_at DESC, c.id DESC
            LIMIT ?
            "#,
        )
        .bind(city_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| CommentWithPoster::try_from(row).map_err(DbError::from))
            .collect()
    }
}
