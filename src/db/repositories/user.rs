//! User repository
//!
//! Database operations for users.
//!
//! This module provides:
//! - `UserRepository` trait defining the interface for user data access
//! - `SqlxUserRepository` implementing the trait for SQLite and MySQL
//!
//! Username and email uniqueness is enforced by the schema; callers detect
//! conflicts with [`crate::db::is_unique_violation`].

use crate::config::DatabaseDriver;
use crate::db::repositories::contains_pattern;
use crate::db::DynDatabasePool;
use crate::models::{ListParams, User, UserRole};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

const USER_COLUMNS: &str = "id, username, email, first_name, last_name, bio, role, \
    is_superuser, is_active, confirmation_code, created_at, updated_at";

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by username
    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Get user by email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Write every mutable column of `user` back to storage
    async fn update(&self, user: &User) -> Result<User>;

    /// Store a new confirmation code, replacing the previous one
    async fn set_confirmation_code(&self, id: i64, code: &str) -> Result<()>;

    /// Activate the account and clear its code if `code` is still current.
    ///
    /// Returns false when the code no longer matches, so a code can only be
    /// exchanged once even under concurrent confirmations.
    async fn consume_confirmation_code(&self, id: i64, code: &str) -> Result<bool>;

    /// Delete a user. Returns false if no such user exists.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// List users ordered by username, optionally filtered by a username substring
    async fn list(&self, search: Option<&str>, params: &ListParams) -> Result<(Vec<User>, i64)>;
}

/// SQLx-based user repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_user_sqlite(self.pool.sqlite()?, user).await,
            DatabaseDriver::Mysql => create_user_mysql(self.pool.mysql()?, user).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_user_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_user_by_id_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_user_by_field_sqlite(self.pool.sqlite()?, "username", username).await
            }
            DatabaseDriver::Mysql => {
                get_user_by_field_mysql(self.pool.mysql()?, "username", username).await
            }
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_user_by_field_sqlite(self.pool.sqlite()?, "email", email).await,
            DatabaseDriver::Mysql => get_user_by_field_mysql(self.pool.mysql()?, "email", email).await,
        }
    }

    async fn update(&self, user: &User) -> Result<User> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_user_sqlite(self.pool.sqlite()?, user).await,
            DatabaseDriver::Mysql => update_user_mysql(self.pool.mysql()?, user).await,
        }
    }

    async fn set_confirmation_code(&self, id: i64, code: &str) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => set_code_sqlite(self.pool.sqlite()?, id, code).await,
            DatabaseDriver::Mysql => set_code_mysql(self.pool.mysql()?, id, code).await,
        }
    }

    async fn consume_confirmation_code(&self, id: i64, code: &str) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => consume_code_sqlite(self.pool.sqlite()?, id, code).await,
            DatabaseDriver::Mysql => consume_code_mysql(self.pool.mysql()?, id, code).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_user_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => delete_user_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn list(&self, search: Option<&str>, params: &ListParams) -> Result<(Vec<User>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_users_sqlite(self.pool.sqlite()?, search, params).await,
            DatabaseDriver::Mysql => list_users_mysql(self.pool.mysql()?, search, params).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_user_sqlite(pool: &SqlitePool, user: &User) -> Result<User> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO users (username, email, first_name, last_name, bio, role,
                           is_superuser, is_active, confirmation_code, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.bio)
    .bind(user.role.to_string())
    .bind(user.is_superuser)
    .bind(user.is_active)
    .bind(&user.confirmation_code)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    Ok(User {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..user.clone()
    })
}

async fn get_user_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by ID")?;

    row.as_ref().map(row_to_user_sqlite).transpose()
}

async fn get_user_by_field_sqlite(pool: &SqlitePool, field: &str, value: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE {} = ?", USER_COLUMNS, field))
        .bind(value)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to get user by {}", field))?;

    row.as_ref().map(row_to_user_sqlite).transpose()
}

async fn update_user_sqlite(pool: &SqlitePool, user: &User) -> Result<User> {
    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE users
        SET username = ?, email = ?, first_name = ?, last_name = ?, bio = ?, role = ?,
            is_superuser = ?, is_active = ?, confirmation_code = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.bio)
    .bind(user.role.to_string())
    .bind(user.is_superuser)
    .bind(user.is_active)
    .bind(&user.confirmation_code)
    .bind(now)
    .bind(user.id)
    .execute(pool)
    .await
    .context("Failed to update user")?;

    Ok(User {
        updated_at: now,
        ..user.clone()
    })
}

async fn set_code_sqlite(pool: &SqlitePool, id: i64, code: &str) -> Result<()> {
    sqlx::query("UPDATE users SET confirmation_code = ?, updated_at = ? WHERE id = ?")
        .bind(code)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to store confirmation code")?;

    Ok(())
}

async fn consume_code_sqlite(pool: &SqlitePool, id: i64, code: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET is_active = 1, confirmation_code = NULL, updated_at = ?
        WHERE id = ? AND confirmation_code = ?
        "#,
    )
    .bind(Utc::now())
    .bind(id)
    .bind(code)
    .execute(pool)
    .await
    .context("Failed to consume confirmation code")?;

    Ok(result.rows_affected() == 1)
}

async fn delete_user_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete user")?;

    Ok(result.rows_affected() > 0)
}

async fn list_users_sqlite(
    pool: &SqlitePool,
    search: Option<&str>,
    params: &ListParams,
) -> Result<(Vec<User>, i64)> {
    let pattern = contains_pattern(search);

    let rows = sqlx::query(&format!(
        "SELECT {} FROM users WHERE (? IS NULL OR username LIKE ? ESCAPE '!') ORDER BY username LIMIT ? OFFSET ?",
        USER_COLUMNS
    ))
    .bind(&pattern)
    .bind(&pattern)
    .bind(params.limit)
    .bind(params.offset)
    .fetch_all(pool)
    .await
    .context("Failed to list users")?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE (? IS NULL OR username LIKE ? ESCAPE '!')")
        .bind(&pattern)
        .bind(&pattern)
        .fetch_one(pool)
        .await
        .context("Failed to count users")?;

    let users = rows.iter().map(row_to_user_sqlite).collect::<Result<Vec<_>>>()?;
    Ok((users, total))
}

fn row_to_user_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    let role_str: String = row.get("role");
    let role = UserRole::from_str(&role_str)
        .with_context(|| format!("Invalid role in database: {}", role_str))?;

    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        bio: row.get("bio"),
        role,
        is_superuser: row.get("is_superuser"),
        is_active: row.get("is_active"),
        confirmation_code: row.get("confirmation_code"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_user_mysql(pool: &MySqlPool, user: &User) -> Result<User> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO users (username, email, first_name, last_name, bio, role,
                           is_superuser, is_active, confirmation_code, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.bio)
    .bind(user.role.to_string())
    .bind(user.is_superuser)
    .bind(user.is_active)
    .bind(&user.confirmation_code)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    Ok(User {
        id: result.last_insert_id() as i64,
        created_at: now,
        updated_at: now,
        ..user.clone()
    })
}

async fn get_user_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by ID")?;

    row.as_ref().map(row_to_user_mysql).transpose()
}

async fn get_user_by_field_mysql(pool: &MySqlPool, field: &str, value: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE {} = ?", USER_COLUMNS, field))
        .bind(value)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to get user by {}", field))?;

    row.as_ref().map(row_to_user_mysql).transpose()
}

async fn update_user_mysql(pool: &MySqlPool, user: &User) -> Result<User> {
    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE users
        SET username = ?, email = ?, first_name = ?, last_name = ?, bio = ?, role = ?,
            is_superuser = ?, is_active = ?, confirmation_code = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.bio)
    .bind(user.role.to_string())
    .bind(user.is_superuser)
    .bind(user.is_active)
    .bind(&user.confirmation_code)
    .bind(now)
    .bind(user.id)
    .execute(pool)
    .await
    .context("Failed to update user")?;

    Ok(User {
        updated_at: now,
        ..user.clone()
    })
}

async fn set_code_mysql(pool: &MySqlPool, id: i64, code: &str) -> Result<()> {
    sqlx::query("UPDATE users SET confirmation_code = ?, updated_at = ? WHERE id = ?")
        .bind(code)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to store confirmation code")?;

    Ok(())
}

async fn consume_code_mysql(pool: &MySqlPool, id: i64, code: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET is_active = TRUE, confirmation_code = NULL, updated_at = ?
        WHERE id = ? AND confirmation_code = ?
        "#,
    )
    .bind(Utc::now())
    .bind(id)
    .bind(code)
    .execute(pool)
    .await
    .context("Failed to consume confirmation code")?;

    Ok(result.rows_affected() == 1)
}

async fn delete_user_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete user")?;

    Ok(result.rows_affected() > 0)
}

async fn list_users_mysql(
    pool: &MySqlPool,
    search: Option<&str>,
    params: &ListParams,
) -> Result<(Vec<User>, i64)> {
    let pattern = contains_pattern(search);

    let rows = sqlx::query(&format!(
        "SELECT {} FROM users WHERE (? IS NULL OR username LIKE ? ESCAPE '!') ORDER BY username LIMIT ? OFFSET ?",
        USER_COLUMNS
    ))
    .bind(&pattern)
    .bind(&pattern)
    .bind(params.limit)
    .bind(params.offset)
    .fetch_all(pool)
    .await
    .context("Failed to list users")?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE (? IS NULL OR username LIKE ? ESCAPE '!')")
        .bind(&pattern)
        .bind(&pattern)
        .fetch_one(pool)
        .await
        .context("Failed to count users")?;

    let users = rows.iter().map(row_to_user_mysql).collect::<Result<Vec<_>>>()?;
    Ok((users, total))
}

fn row_to_user_mysql(row: &sqlx::mysql::MySqlRow) -> Result<User> {
    let role_str: String = row.get("role");
    let role = UserRole::from_str(&role_str)
        .with_context(|| format!("Invalid role in database: {}", role_str))?;

    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        bio: row.get("bio"),
        role,
        is_superuser: row.get("is_superuser"),
        is_active: row.get("is_active"),
        confirmation_code: row.get("confirmation_code"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
