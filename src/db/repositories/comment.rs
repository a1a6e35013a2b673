//! Comment repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Comment, ListParams};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const COMMENT_SELECT: &str = r#"
    SELECT c.id, c.review_id, c.author_id, u.username AS author, c.text, c.pub_date
    FROM comments c
    JOIN users u ON u.id = c.author_id
"#;

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(&self, comment: &Comment) -> Result<Comment>;

    /// Get a comment, scoped to its review
    async fn get(&self, review_id: i64, id: i64) -> Result<Option<Comment>>;

    /// Update the text
    async fn update(&self, comment: &Comment) -> Result<Comment>;

    async fn delete(&self, id: i64) -> Result<bool>;

    /// Comments on a review, oldest first
    async fn list_by_review(&self, review_id: i64, params: &ListParams) -> Result<(Vec<Comment>, i64)>;
}

/// SQLx-based comment repository implementation
pub struct SqlxCommentRepository {
    pool: DynDatabasePool,
}

impl SqlxCommentRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(&self, comment: &Comment) -> Result<Comment> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_comment_sqlite(self.pool.sqlite()?, comment).await,
            DatabaseDriver::Mysql => create_comment_mysql(self.pool.mysql()?, comment).await,
        }
    }

    async fn get(&self, review_id: i64, id: i64) -> Result<Option<Comment>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_comment_sqlite(self.pool.sqlite()?, review_id, id).await,
            DatabaseDriver::Mysql => get_comment_mysql(self.pool.mysql()?, review_id, id).await,
        }
    }

    async fn update(&self, comment: &Comment) -> Result<Comment> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_comment_sqlite(self.pool.sqlite()?, comment).await,
            DatabaseDriver::Mysql => update_comment_mysql(self.pool.mysql()?, comment).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_comment_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => delete_comment_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn list_by_review(&self, review_id: i64, params: &ListParams) -> Result<(Vec<Comment>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_comments_sqlite(self.pool.sqlite()?, review_id, params).await,
            DatabaseDriver::Mysql => list_comments_mysql(self.pool.mysql()?, review_id, params).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_comment_sqlite(pool: &SqlitePool, comment: &Comment) -> Result<Comment> {
    let result = sqlx::query(
        r#"
        INSERT INTO comments (review_id, author_id, text, pub_date)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(comment.review_id)
    .bind(comment.author_id)
    .bind(&comment.text)
    .bind(comment.pub_date)
    .execute(pool)
    .await
    .context("Failed to create comment")?;

    Ok(Comment {
        id: result.last_insert_rowid(),
        ..comment.clone()
    })
}

async fn get_comment_sqlite(pool: &SqlitePool, review_id: i64, id: i64) -> Result<Option<Comment>> {
    let row = sqlx::query(&format!("{} WHERE c.id = ? AND c.review_id = ?", COMMENT_SELECT))
        .bind(id)
        .bind(review_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get comment")?;

    Ok(row.as_ref().map(row_to_comment_sqlite))
}

async fn update_comment_sqlite(pool: &SqlitePool, comment: &Comment) -> Result<Comment> {
    sqlx::query("UPDATE comments SET text = ? WHERE id = ?")
        .bind(&comment.text)
        .bind(comment.id)
        .execute(pool)
        .await
        .context("Failed to update comment")?;

    Ok(comment.clone())
}

async fn delete_comment_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM comments WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete comment")?;

    Ok(result.rows_affected() > 0)
}

async fn list_comments_sqlite(
    pool: &SqlitePool,
    review_id: i64,
    params: &ListParams,
) -> Result<(Vec<Comment>, i64)> {
    let rows = sqlx::query(&format!(
        "{} WHERE c.review_id = ? ORDER BY c.pub_date, c.id LIMIT ? OFFSET ?",
        COMMENT_SELECT
    ))
    .bind(review_id)
    .bind(params.limit)
    .bind(params.offset)
    .fetch_all(pool)
    .await
    .context("Failed to list comments")?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE review_id = ?")
        .bind(review_id)
        .fetch_one(pool)
        .await
        .context("Failed to count comments")?;

    Ok((rows.iter().map(row_to_comment_sqlite).collect(), total))
}

fn row_to_comment_sqlite(row: &sqlx::sqlite::SqliteRow) -> Comment {
    Comment {
        id: row.get("id"),
        review_id: row.get("review_id"),
        author_id: row.get("author_id"),
        author: row.get("author"),
        text: row.get("text"),
        pub_date: row.get("pub_date"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_comment_mysql(pool: &MySqlPool, comment: &Comment) -> Result<Comment> {
    let result = sqlx::query(
        r#"
        INSERT INTO comments (review_id, author_id, text, pub_date)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(comment.review_id)
    .bind(comment.author_id)
    .bind(&comment.text)
    .bind(comment.pub_date)
    .execute(pool)
    .await
    .context("Failed to create comment")?;

    Ok(Comment {
        id: result.last_insert_id() as i64,
        ..comment.clone()
    })
}

async fn get_comment_mysql(pool: &MySqlPool, review_id: i64, id: i64) -> Result<Option<Comment>> {
    let row = sqlx::query(&format!("{} WHERE c.id = ? AND c.review_id = ?", COMMENT_SELECT))
        .bind(id)
        .bind(review_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get comment")?;

    Ok(row.as_ref().map(row_to_comment_mysql))
}

async fn update_comment_mysql(pool: &MySqlPool, comment: &Comment) -> Result<Comment> {
    sqlx::query("UPDATE comments SET text = ? WHERE id = ?")
        .bind(&comment.text)
        .bind(comment.id)
        .execute(pool)
        .await
        .context("Failed to update comment")?;

    Ok(comment.clone())
}

async fn delete_comment_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM comments WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete comment")?;

    Ok(result.rows_affected() > 0)
}

async fn list_comments_mysql(
    pool: &MySqlPool,
    review_id: i64,
    params: &ListParams,
) -> Result<(Vec<Comment>, i64)> {
    let rows = sqlx::query(&format!(
        "{} WHERE c.review_id = ? ORDER BY c.pub_date, c.id LIMIT ? OFFSET ?",
        COMMENT_SELECT
    ))
    .bind(review_id)
    .bind(params.limit)
    .bind(params.offset)
    .fetch_all(pool)
    .await
    .context("Failed to list comments")?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE review_id = ?")
        .bind(review_id)
        .fetch_one(pool)
        .await
        .context("Failed to count comments")?;

    Ok((rows.iter().map(row_to_comment_mysql).collect(), total))
}

fn row_to_comment_mysql(row: &sqlx::mysql::MySqlRow) -> Comment {
    Comment {
        id: row.get("id"),
        review_id: row.get("review_id"),
        author_id: row.get("author_id"),
        author: row.get("author"),
        text: row.get("text"),
        pub_date: row.get("pub_date"),
    }
}
