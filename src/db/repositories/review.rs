//! Review repository
//!
//! One review per (title, author) is guaranteed by a `UNIQUE` index; a
//! second insert fails with a unique violation that the review service maps
//! to a duplicate error.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{ListParams, Review};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const REVIEW_SELECT: &str = r#"
    SELECT r.id, r.title_id, r.author_id, u.username AS author, r.text, r.score, r.pub_date
    FROM reviews r
    JOIN users u ON u.id = r.author_id
"#;

/// Review repository trait
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Insert a review. `author` is echoed back, not stored.
    async fn create(&self, review: &Review) -> Result<Review>;

    /// Get a review, scoped to its title
    async fn get(&self, title_id: i64, id: i64) -> Result<Option<Review>>;

    /// Update text and score
    async fn update(&self, review: &Review) -> Result<Review>;

    async fn delete(&self, id: i64) -> Result<bool>;

    /// Reviews of a title, oldest first
    async fn list_by_title(&self, title_id: i64, params: &ListParams) -> Result<(Vec<Review>, i64)>;

    /// IDs of the titles `author_id` has reviewed
    async fn titles_reviewed_by(&self, author_id: i64) -> Result<Vec<i64>>;
}

/// SQLx-based review repository implementation
pub struct SqlxReviewRepository {
    pool: DynDatabasePool,
}

impl SqlxReviewRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ReviewRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ReviewRepository for SqlxReviewRepository {
    async fn create(&self, review: &Review) -> Result<Review> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_review_sqlite(self.pool.sqlite()?, review).await,
            DatabaseDriver::Mysql => create_review_mysql(self.pool.mysql()?, review).await,
        }
    }

    async fn get(&self, title_id: i64, id: i64) -> Result<Option<Review>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_review_sqlite(self.pool.sqlite()?, title_id, id).await,
            DatabaseDriver::Mysql => get_review_mysql(self.pool.mysql()?, title_id, id).await,
        }
    }

    async fn update(&self, review: &Review) -> Result<Review> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_review_sqlite(self.pool.sqlite()?, review).await,
            DatabaseDriver::Mysql => update_review_mysql(self.pool.mysql()?, review).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_review_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => delete_review_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn list_by_title(&self, title_id: i64, params: &ListParams) -> Result<(Vec<Review>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_reviews_sqlite(self.pool.sqlite()?, title_id, params).await,
            DatabaseDriver::Mysql => list_reviews_mysql(self.pool.mysql()?, title_id, params).await,
        }
    }

    async fn titles_reviewed_by(&self, author_id: i64) -> Result<Vec<i64>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => reviewed_titles_sqlite(self.pool.sqlite()?, author_id).await,
            DatabaseDriver::Mysql => reviewed_titles_mysql(self.pool.mysql()?, author_id).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_review_sqlite(pool: &SqlitePool, review: &Review) -> Result<Review> {
    let result = sqlx::query(
        r#"
        INSERT INTO reviews (title_id, author_id, text, score, pub_date)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(review.title_id)
    .bind(review.author_id)
    .bind(&review.text)
    .bind(review.score)
    .bind(review.pub_date)
    .execute(pool)
    .await
    .context("Failed to create review")?;

    Ok(Review {
        id: result.last_insert_rowid(),
        ..review.clone()
    })
}

async fn get_review_sqlite(pool: &SqlitePool, title_id: i64, id: i64) -> Result<Option<Review>> {
    let row = sqlx::query(&format!("{} WHERE r.id = ? AND r.title_id = ?", REVIEW_SELECT))
        .bind(id)
        .bind(title_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get review")?;

    Ok(row.as_ref().map(row_to_review_sqlite))
}

async fn update_review_sqlite(pool: &SqlitePool, review: &Review) -> Result<Review> {
    sqlx::query("UPDATE reviews SET text = ?, score = ? WHERE id = ?")
        .bind(&review.text)
        .bind(review.score)
        .bind(review.id)
        .execute(pool)
        .await
        .context("Failed to update review")?;

    Ok(review.clone())
}

async fn delete_review_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM reviews WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete review")?;

    Ok(result.rows_affected() > 0)
}

async fn list_reviews_sqlite(
    pool: &SqlitePool,
    title_id: i64,
    params: &ListParams,
) -> Result<(Vec<Review>, i64)> {
    let rows = sqlx::query(&format!(
        "{} WHERE r.title_id = ? ORDER BY r.pub_date, r.id LIMIT ? OFFSET ?",
        REVIEW_SELECT
    ))
    .bind(title_id)
    .bind(params.limit)
    .bind(params.offset)
    .fetch_all(pool)
    .await
    .context("Failed to list reviews")?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE title_id = ?")
        .bind(title_id)
        .fetch_one(pool)
        .await
        .context("Failed to count reviews")?;

    Ok((rows.iter().map(row_to_review_sqlite).collect(), total))
}

async fn reviewed_titles_sqlite(pool: &SqlitePool, author_id: i64) -> Result<Vec<i64>> {
    sqlx::query_scalar("SELECT title_id FROM reviews WHERE author_id = ? ORDER BY title_id")
        .bind(author_id)
        .fetch_all(pool)
        .await
        .context("Failed to load reviewed titles")
}

fn row_to_review_sqlite(row: &sqlx::sqlite::SqliteRow) -> Review {
    Review {
        id: row.get("id"),
        title_id: row.get("title_id"),
        author_id: row.get("author_id"),
        author: row.get("author"),
        text: row.get("text"),
        score: row.get("score"),
        pub_date: row.get("pub_date"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_review_mysql(pool: &MySqlPool, review: &Review) -> Result<Review> {
    let result = sqlx::query(
        r#"
        INSERT INTO reviews (title_id, author_id, text, score, pub_date)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(review.title_id)
    .bind(review.author_id)
    .bind(&review.text)
    .bind(review.score)
    .bind(review.pub_date)
    .execute(pool)
    .await
    .context("Failed to create review")?;

    Ok(Review {
        id: result.last_insert_id() as i64,
        ..review.clone()
    })
}

async fn get_review_mysql(pool: &MySqlPool, title_id: i64, id: i64) -> Result<Option<Review>> {
    let row = sqlx::query(&format!("{} WHERE r.id = ? AND r.title_id = ?", REVIEW_SELECT))
        .bind(id)
        .bind(title_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get review")?;

    Ok(row.as_ref().map(row_to_review_mysql))
}

async fn update_review_mysql(pool: &MySqlPool, review: &Review) -> Result<Review> {
    sqlx::query("UPDATE reviews SET text = ?, score = ? WHERE id = ?")
        .bind(&review.text)
        .bind(review.score)
        .bind(review.id)
        .execute(pool)
        .await
        .context("Failed to update review")?;

    Ok(review.clone())
}

async fn delete_review_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM reviews WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete review")?;

    Ok(result.rows_affected() > 0)
}

async fn list_reviews_mysql(
    pool: &MySqlPool,
    title_id: i64,
    params: &ListParams,
) -> Result<(Vec<Review>, i64)> {
    let rows = sqlx::query(&format!(
        "{} WHERE r.title_id = ? ORDER BY r.pub_date, r.id LIMIT ? OFFSET ?",
        REVIEW_SELECT
    ))
    .bind(title_id)
    .bind(params.limit)
    .bind(params.offset)
    .fetch_all(pool)
    .await
    .context("Failed to list reviews")?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE title_id = ?")
        .bind(title_id)
        .fetch_one(pool)
        .await
        .context("Failed to count reviews")?;

    Ok((rows.iter().map(row_to_review_mysql).collect(), total))
}

async fn reviewed_titles_mysql(pool: &MySqlPool, author_id: i64) -> Result<Vec<i64>> {
    sqlx::query_scalar("SELECT title_id FROM reviews WHERE author_id = ? ORDER BY title_id")
        .bind(author_id)
        .fetch_all(pool)
        .await
        .context("Failed to load reviewed titles")
}

fn row_to_review_mysql(row: &sqlx::mysql::MySqlRow) -> Review {
    Review {
        id: row.get("id"),
        title_id: row.get("title_id"),
        author_id: row.get("author_id"),
        author: row.get("author"),
        text: row.get("text"),
        score: row.get("score"),
        pub_date: row.get("pub_date"),
    }
}
