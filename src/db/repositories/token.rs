//! Access token repository
//!
//! - `TokenRepository` trait defining token storage
//! - `SqlxTokenRepository` implementing it for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::AccessToken;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Access token repository trait
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Store a freshly minted token
    async fn create(&self, token: &AccessToken) -> Result<AccessToken>;

    /// Look up a token by value, expired or not
    async fn get(&self, token: &str) -> Result<Option<AccessToken>>;

    /// Delete tokens whose expiry has passed
    async fn delete_expired(&self) -> Result<u64>;
}

/// SQLx-based token repository implementation
pub struct SqlxTokenRepository {
    pool: DynDatabasePool,
}

impl SqlxTokenRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TokenRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TokenRepository for SqlxTokenRepository {
    async fn create(&self, token: &AccessToken) -> Result<AccessToken> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_token_sqlite(self.pool.sqlite()?, token).await,
            DatabaseDriver::Mysql => create_token_mysql(self.pool.mysql()?, token).await,
        }
    }

    async fn get(&self, token: &str) -> Result<Option<AccessToken>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_token_sqlite(self.pool.sqlite()?, token).await,
            DatabaseDriver::Mysql => get_token_mysql(self.pool.mysql()?, token).await,
        }
    }

    async fn delete_expired(&self) -> Result<u64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_expired_tokens_sqlite(self.pool.sqlite()?).await,
            DatabaseDriver::Mysql => delete_expired_tokens_mysql(self.pool.mysql()?).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_token_sqlite(pool: &SqlitePool, token: &AccessToken) -> Result<AccessToken> {
    sqlx::query(
        r#"
        INSERT INTO access_tokens (token, user_id, expires_at, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&token.token)
    .bind(token.user_id)
    .bind(token.expires_at)
    .bind(token.created_at)
    .execute(pool)
    .await
    .context("Failed to create access token")?;

    Ok(token.clone())
}

async fn get_token_sqlite(pool: &SqlitePool, token: &str) -> Result<Option<AccessToken>> {
    let row = sqlx::query(
        r#"
        SELECT token, user_id, expires_at, created_at
        FROM access_tokens
        WHERE token = ?
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await
    .context("Failed to get access token")?;

    Ok(row.map(|row| AccessToken {
        token: row.get("token"),
        user_id: row.get("user_id"),
        expires_at: row.get("expires_at"),
        created_at: row.get("created_at"),
    }))
}

async fn delete_expired_tokens_sqlite(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM access_tokens WHERE expires_at < ?")
        .bind(Utc::now())
        .execute(pool)
        .await
        .context("Failed to delete expired access tokens")?;

    Ok(result.rows_affected())
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_token_mysql(pool: &MySqlPool, token: &AccessToken) -> Result<AccessToken> {
    sqlx::query(
        r#"
        INSERT INTO access_tokens (token, user_id, expires_at, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&token.token)
    .bind(token.user_id)
    .bind(token.expires_at)
    .bind(token.created_at)
    .execute(pool)
    .await
    .context("Failed to create access token")?;

    Ok(token.clone())
}

async fn get_token_mysql(pool: &MySqlPool, token: &str) -> Result<Option<AccessToken>> {
    let row = sqlx::query(
        r#"
        SELECT token, user_id, expires_at, created_at
        FROM access_tokens
        WHERE token = ?
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await
    .context("Failed to get access token")?;

    Ok(row.map(|row| AccessToken {
        token: row.get("token"),
        user_id: row.get("user_id"),
        expires_at: row.get("expires_at"),
        created_at: row.get("created_at"),
    }))
}

async fn delete_expired_tokens_mysql(pool: &MySqlPool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM access_tokens WHERE expires_at < ?")
        .bind(Utc::now())
        .execute(pool)
        .await
        .context("Failed to delete expired access tokens")?;

    Ok(result.rows_affected())
}
