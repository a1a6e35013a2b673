//! Category and genre repository
//!
//! Both tables share a shape, so one implementation serves both; the
//! `TaxonomyKind` chosen at construction selects the table.

use crate::config::DatabaseDriver;
use crate::db::repositories::contains_pattern;
use crate::db::DynDatabasePool;
use crate::models::{ListParams, Taxon, TaxonomyKind};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Category/genre repository trait
#[async_trait]
pub trait TaxonomyRepository: Send + Sync {
    /// Which table this repository reads and writes
    fn kind(&self) -> TaxonomyKind;

    /// Insert a new entry. A duplicate slug fails with a unique violation.
    async fn create(&self, taxon: &Taxon) -> Result<Taxon>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Taxon>>;

    /// Delete by slug. Returns false if nothing matched.
    async fn delete_by_slug(&self, slug: &str) -> Result<bool>;

    /// List entries ordered by name, optionally filtered by a name substring
    async fn list(&self, search: Option<&str>, params: &ListParams) -> Result<(Vec<Taxon>, i64)>;
}

/// SQLx-based taxonomy repository implementation
pub struct SqlxTaxonomyRepository {
    pool: DynDatabasePool,
    kind: TaxonomyKind,
}

impl SqlxTaxonomyRepository {
    pub fn new(pool: DynDatabasePool, kind: TaxonomyKind) -> Self {
        Self { pool, kind }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool, kind: TaxonomyKind) -> Arc<dyn TaxonomyRepository> {
        Arc::new(Self::new(pool, kind))
    }
}

#[async_trait]
impl TaxonomyRepository for SqlxTaxonomyRepository {
    fn kind(&self) -> TaxonomyKind {
        self.kind
    }

    async fn create(&self, taxon: &Taxon) -> Result<Taxon> {
        let table = self.kind.table();
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_taxon_sqlite(self.pool.sqlite()?, table, taxon).await,
            DatabaseDriver::Mysql => create_taxon_mysql(self.pool.mysql()?, table, taxon).await,
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Taxon>> {
        let table = self.kind.table();
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_taxon_sqlite(self.pool.sqlite()?, table, slug).await,
            DatabaseDriver::Mysql => get_taxon_mysql(self.pool.mysql()?, table, slug).await,
        }
    }

    async fn delete_by_slug(&self, slug: &str) -> Result<bool> {
        let table = self.kind.table();
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_taxon_sqlite(self.pool.sqlite()?, table, slug).await,
            DatabaseDriver::Mysql => delete_taxon_mysql(self.pool.mysql()?, table, slug).await,
        }
    }

    async fn list(&self, search: Option<&str>, params: &ListParams) -> Result<(Vec<Taxon>, i64)> {
        let table = self.kind.table();
        let pattern = contains_pattern(search);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_taxa_sqlite(self.pool.sqlite()?, table, pattern, params).await,
            DatabaseDriver::Mysql => list_taxa_mysql(self.pool.mysql()?, table, pattern, params).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_taxon_sqlite(pool: &SqlitePool, table: &str, taxon: &Taxon) -> Result<Taxon> {
    let result = sqlx::query(&format!("INSERT INTO {} (name, slug) VALUES (?, ?)", table))
        .bind(&taxon.name)
        .bind(&taxon.slug)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to insert into {}", table))?;

    Ok(Taxon {
        id: result.last_insert_rowid(),
        ..taxon.clone()
    })
}

async fn get_taxon_sqlite(pool: &SqlitePool, table: &str, slug: &str) -> Result<Option<Taxon>> {
    let row = sqlx::query(&format!("SELECT id, name, slug FROM {} WHERE slug = ?", table))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to get from {} by slug", table))?;

    Ok(row.map(|row| Taxon {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
    }))
}

async fn delete_taxon_sqlite(pool: &SqlitePool, table: &str, slug: &str) -> Result<bool> {
    let result = sqlx::query(&format!("DELETE FROM {} WHERE slug = ?", table))
        .bind(slug)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to delete from {}", table))?;

    Ok(result.rows_affected() > 0)
}

async fn list_taxa_sqlite(
    pool: &SqlitePool,
    table: &str,
    pattern: Option<String>,
    params: &ListParams,
) -> Result<(Vec<Taxon>, i64)> {
    let rows = sqlx::query(&format!(
        "SELECT id, name, slug FROM {} WHERE (? IS NULL OR name LIKE ? ESCAPE '!') ORDER BY name, id LIMIT ? OFFSET ?",
        table
    ))
    .bind(&pattern)
    .bind(&pattern)
    .bind(params.limit)
    .bind(params.offset)
    .fetch_all(pool)
    .await
    .with_context(|| format!("Failed to list {}", table))?;

    let total: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM {} WHERE (? IS NULL OR name LIKE ? ESCAPE '!')",
        table
    ))
    .bind(&pattern)
    .bind(&pattern)
    .fetch_one(pool)
    .await
    .with_context(|| format!("Failed to count {}", table))?;

    let items = rows
        .into_iter()
        .map(|row| Taxon {
            id: row.get("id"),
            name: row.get("name"),
            slug: row.get("slug"),
        })
        .collect();
    Ok((items, total))
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_taxon_mysql(pool: &MySqlPool, table: &str, taxon: &Taxon) -> Result<Taxon> {
    let result = sqlx::query(&format!("INSERT INTO {} (name, slug) VALUES (?, ?)", table))
        .bind(&taxon.name)
        .bind(&taxon.slug)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to insert into {}", table))?;

    Ok(Taxon {
        id: result.last_insert_id() as i64,
        ..taxon.clone()
    })
}

async fn get_taxon_mysql(pool: &MySqlPool, table: &str, slug: &str) -> Result<Option<Taxon>> {
    let row = sqlx::query(&format!("SELECT id, name, slug FROM {} WHERE slug = ?", table))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to get from {} by slug", table))?;

    Ok(row.map(|row| Taxon {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
    }))
}

async fn delete_taxon_mysql(pool: &MySqlPool, table: &str, slug: &str) -> Result<bool> {
    let result = sqlx::query(&format!("DELETE FROM {} WHERE slug = ?", table))
        .bind(slug)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to delete from {}", table))?;

    Ok(result.rows_affected() > 0)
}

async fn list_taxa_mysql(
    pool: &MySqlPool,
    table: &str,
    pattern: Option<String>,
    params: &ListParams,
) -> Result<(Vec<Taxon>, i64)> {
    let rows = sqlx::query(&format!(
        "SELECT id, name, slug FROM {} WHERE (? IS NULL OR name LIKE ? ESCAPE '!') ORDER BY name, id LIMIT ? OFFSET ?",
        table
    ))
    .bind(&pattern)
    .bind(&pattern)
    .bind(params.limit)
    .bind(params.offset)
    .fetch_all(pool)
    .await
    .with_context(|| format!("Failed to list {}", table))?;

    let total: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM {} WHERE (? IS NULL OR name LIKE ? ESCAPE '!')",
        table
    ))
    .bind(&pattern)
    .bind(&pattern)
    .fetch_one(pool)
    .await
    .with_context(|| format!("Failed to count {}", table))?;

    let items = rows
        .into_iter()
        .map(|row| Taxon {
            id: row.get("id"),
            name: row.get("name"),
            slug: row.get("slug"),
        })
        .collect();
    Ok((items, total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, is_unique_violation, migrations};

    async fn setup_test_repos() -> (SqlxTaxonomyRepository, SqlxTaxonomyRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        (
            SqlxTaxonomyRepository::new(pool.clone(), TaxonomyKind::Category),
            SqlxTaxonomyRepository::new(pool, TaxonomyKind::Genre),
        )
    }

    #[tokio::test]
    async fn test_create_and_get_by_slug() {
        let (categories, _) = setup_test_repos().await;
        let created = categories.create(&Taxon::new("Films", "films")).await.unwrap();
        assert!(created.id > 0);

        let found = categories.get_by_slug("films").await.unwrap().expect("Category not found");
        assert_eq!(found, created);
        assert!(categories.get_by_slug("books").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_kinds_are_separate_tables() {
        let (categories, genres) = setup_test_repos().await;
        categories.create(&Taxon::new("Music", "music")).await.unwrap();

        assert!(genres.get_by_slug("music").await.unwrap().is_none());
        genres.create(&Taxon::new("Music", "music")).await.expect("Same slug in another table");
        assert_eq!(genres.kind(), TaxonomyKind::Genre);
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_unique_violation() {
        let (_, genres) = setup_test_repos().await;
        genres.create(&Taxon::new("Drama", "drama")).await.unwrap();

        let err = genres
            .create(&Taxon::new("Drama 2", "drama"))
            .await
            .expect_err("Duplicate slug should fail");
        assert!(is_unique_violation(&err));
    }

    #[tokio::test]
    async fn test_delete_by_slug() {
        let (_, genres) = setup_test_repos().await;
        genres.create(&Taxon::new("Drama", "drama")).await.unwrap();

        assert!(genres.delete_by_slug("drama").await.unwrap());
        assert!(!genres.delete_by_slug("drama").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_with_search() {
        let (_, genres) = setup_test_repos().await;
        for (name, slug) in [("Rock", "rock"), ("Drama", "drama"), ("Rock'n'roll", "rnr")] {
            genres.create(&Taxon::new(name, slug)).await.unwrap();
        }

        let (all, total) = genres.list(None, &ListParams::default()).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(all[0].slug, "drama");

        let (rock, total) = genres.list(Some("Rock"), &ListParams::default()).await.unwrap();
        assert_eq!(total, 2);
        assert!(rock.iter().all(|g| g.name.starts_with("Rock")));
    }
}
