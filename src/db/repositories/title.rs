//! Title repository
//!
//! Titles are stored in `titles` with their genre links in `title_genres`.
//! Reads embed the full category and genre entries. Writes that touch both
//! tables run in one transaction.

use crate::config::DatabaseDriver;
use crate::db::repositories::contains_pattern;
use crate::db::DynDatabasePool;
use crate::models::{ListParams, Taxon, Title, TitleFilter};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;

const TITLE_SELECT: &str = r#"
    SELECT t.id, t.name, t.year, t.description, t.rating,
           c.id AS category_id, c.name AS category_name, c.slug AS category_slug
    FROM titles t
    LEFT JOIN categories c ON c.id = t.category_id
"#;

const TITLE_FILTER: &str = r#"
    WHERE (? IS NULL OR c.slug = ?)
      AND (? IS NULL OR EXISTS (
            SELECT 1 FROM title_genres tg
            JOIN genres g ON g.id = tg.genre_id
            WHERE tg.title_id = t.id AND g.slug = ?))
      AND (? IS NULL OR t.year = ?)
      AND (? IS NULL OR t.name LIKE ? ESCAPE '!')
"#;

/// Title repository trait
#[async_trait]
pub trait TitleRepository: Send + Sync {
    /// Insert a title together with its genre links.
    ///
    /// `category` and `genre` entries must carry their storage IDs.
    async fn create(&self, title: &Title) -> Result<Title>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Title>>;

    /// Rewrite name, year, description, category and genre links.
    /// The stored rating is left alone.
    async fn update(&self, title: &Title) -> Result<Title>;

    /// Delete a title. Its reviews and comments cascade.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// List titles matching every given filter, ordered by ID
    async fn list(&self, filter: &TitleFilter, params: &ListParams) -> Result<(Vec<Title>, i64)>;

    /// Recompute the stored rating from the current review scores in one
    /// statement and return it. `None` when unreviewed or the title is gone.
    async fn refresh_rating(&self, id: i64) -> Result<Option<i32>>;
}

/// SQLx-based title repository implementation
pub struct SqlxTitleRepository {
    pool: DynDatabasePool,
}

impl SqlxTitleRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TitleRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TitleRepository for SqlxTitleRepository {
    async fn create(&self, title: &Title) -> Result<Title> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_title_sqlite(self.pool.sqlite()?, title).await,
            DatabaseDriver::Mysql => create_title_mysql(self.pool.mysql()?, title).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Title>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_title_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_title_by_id_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn update(&self, title: &Title) -> Result<Title> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_title_sqlite(self.pool.sqlite()?, title).await,
            DatabaseDriver::Mysql => update_title_mysql(self.pool.mysql()?, title).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_title_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => delete_title_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn list(&self, filter: &TitleFilter, params: &ListParams) -> Result<(Vec<Title>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_titles_sqlite(self.pool.sqlite()?, filter, params).await,
            DatabaseDriver::Mysql => list_titles_mysql(self.pool.mysql()?, filter, params).await,
        }
    }

    async fn refresh_rating(&self, id: i64) -> Result<Option<i32>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => refresh_rating_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => refresh_rating_mysql(self.pool.mysql()?, id).await,
        }
    }
}

fn genre_query(count: usize) -> String {
    let placeholders = vec!["?"; count].join(", ");
    format!(
        r#"
        SELECT tg.title_id, g.id, g.name, g.slug
        FROM title_genres tg
        JOIN genres g ON g.id = tg.genre_id
        WHERE tg.title_id IN ({})
        ORDER BY g.name, g.id
        "#,
        placeholders
    )
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_title_sqlite(pool: &SqlitePool, title: &Title) -> Result<Title> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(
        r#"
        INSERT INTO titles (name, year, description, category_id, rating)
        VALUES (?, ?, ?, ?, NULL)
        "#,
    )
    .bind(&title.name)
    .bind(title.year)
    .bind(&title.description)
    .bind(title.category.as_ref().map(|c| c.id))
    .execute(&mut *tx)
    .await
    .context("Failed to create title")?;

    let id = result.last_insert_rowid();

    for genre in &title.genre {
        sqlx::query("INSERT INTO title_genres (title_id, genre_id) VALUES (?, ?)")
            .bind(id)
            .bind(genre.id)
            .execute(&mut *tx)
            .await
            .context("Failed to link genre to title")?;
    }

    tx.commit().await.context("Failed to commit title")?;

    Ok(Title {
        id,
        rating: None,
        ..title.clone()
    })
}

async fn get_title_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Title>> {
    let row = sqlx::query(&format!("{} WHERE t.id = ?", TITLE_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get title by ID")?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut title = row_to_title_sqlite(&row);
    let mut genres = load_genres_sqlite(pool, &[id]).await?;
    title.genre = genres.remove(&id).unwrap_or_default();
    Ok(Some(title))
}

async fn update_title_sqlite(pool: &SqlitePool, title: &Title) -> Result<Title> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query(
        r#"
        UPDATE titles
        SET name = ?, year = ?, description = ?, category_id = ?
        WHERE id = ?
        "#,
    )
    .bind(&title.name)
    .bind(title.year)
    .bind(&title.description)
    .bind(title.category.as_ref().map(|c| c.id))
    .bind(title.id)
    .execute(&mut *tx)
    .await
    .context("Failed to update title")?;

    sqlx::query("DELETE FROM title_genres WHERE title_id = ?")
        .bind(title.id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear title genres")?;

    for genre in &title.genre {
        sqlx::query("INSERT INTO title_genres (title_id, genre_id) VALUES (?, ?)")
            .bind(title.id)
            .bind(genre.id)
            .execute(&mut *tx)
            .await
            .context("Failed to link genre to title")?;
    }

    tx.commit().await.context("Failed to commit title update")?;

    Ok(title.clone())
}

async fn delete_title_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM titles WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete title")?;

    Ok(result.rows_affected() > 0)
}

async fn list_titles_sqlite(
    pool: &SqlitePool,
    filter: &TitleFilter,
    params: &ListParams,
) -> Result<(Vec<Title>, i64)> {
    let pattern = contains_pattern(filter.name.as_deref());

    let rows = sqlx::query(&format!(
        "{} {} ORDER BY t.id LIMIT ? OFFSET ?",
        TITLE_SELECT, TITLE_FILTER
    ))
    .bind(&filter.category)
    .bind(&filter.category)
    .bind(&filter.genre)
    .bind(&filter.genre)
    .bind(filter.year)
    .bind(filter.year)
    .bind(&pattern)
    .bind(&pattern)
    .bind(params.limit)
    .bind(params.offset)
    .fetch_all(pool)
    .await
    .context("Failed to list titles")?;

    let total: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM titles t LEFT JOIN categories c ON c.id = t.category_id {}",
        TITLE_FILTER
    ))
    .bind(&filter.category)
    .bind(&filter.category)
    .bind(&filter.genre)
    .bind(&filter.genre)
    .bind(filter.year)
    .bind(filter.year)
    .bind(&pattern)
    .bind(&pattern)
    .fetch_one(pool)
    .await
    .context("Failed to count titles")?;

    let mut titles: Vec<Title> = rows.iter().map(row_to_title_sqlite).collect();
    let ids: Vec<i64> = titles.iter().map(|t| t.id).collect();
    let mut genres = load_genres_sqlite(pool, &ids).await?;
    for title in &mut titles {
        title.genre = genres.remove(&title.id).unwrap_or_default();
    }

    Ok((titles, total))
}

async fn refresh_rating_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<i32>> {
    sqlx::query(
        r#"
        UPDATE titles
        SET rating = (SELECT CAST(ROUND(AVG(score)) AS INTEGER) FROM reviews WHERE title_id = ?)
        WHERE id = ?
        "#,
    )
    .bind(id)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update title rating")?;

    let rating: Option<Option<i32>> = sqlx::query_scalar("SELECT rating FROM titles WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to read title rating")?;

    Ok(rating.flatten())
}

async fn load_genres_sqlite(pool: &SqlitePool, title_ids: &[i64]) -> Result<HashMap<i64, Vec<Taxon>>> {
    let mut genres: HashMap<i64, Vec<Taxon>> = HashMap::new();
    if title_ids.is_empty() {
        return Ok(genres);
    }

    let sql = genre_query(title_ids.len());
    let mut query = sqlx::query(&sql);
    for id in title_ids {
        query = query.bind(*id);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to load title genres")?;

    for row in rows {
        genres.entry(row.get("title_id")).or_default().push(Taxon {
            id: row.get("id"),
            name: row.get("name"),
            slug: row.get("slug"),
        });
    }
    Ok(genres)
}

fn row_to_title_sqlite(row: &sqlx::sqlite::SqliteRow) -> Title {
    let category_id: Option<i64> = row.get("category_id");

    Title {
        id: row.get("id"),
        name: row.get("name"),
        year: row.get("year"),
        description: row.get("description"),
        category: category_id.map(|id| Taxon {
            id,
            name: row.get("category_name"),
            slug: row.get("category_slug"),
        }),
        genre: Vec::new(),
        rating: row.get("rating"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_title_mysql(pool: &MySqlPool, title: &Title) -> Result<Title> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(
        r#"
        INSERT INTO titles (name, year, description, category_id, rating)
        VALUES (?, ?, ?, ?, NULL)
        "#,
    )
    .bind(&title.name)
    .bind(title.year)
    .bind(&title.description)
    .bind(title.category.as_ref().map(|c| c.id))
    .execute(&mut *tx)
    .await
    .context("Failed to create title")?;

    let id = result.last_insert_id() as i64;

    for genre in &title.genre {
        sqlx::query("INSERT INTO title_genres (title_id, genre_id) VALUES (?, ?)")
            .bind(id)
            .bind(genre.id)
            .execute(&mut *tx)
            .await
            .context("Failed to link genre to title")?;
    }

    tx.commit().await.context("Failed to commit title")?;

    Ok(Title {
        id,
        rating: None,
        ..title.clone()
    })
}

async fn get_title_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Title>> {
    let row = sqlx::query(&format!("{} WHERE t.id = ?", TITLE_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get title by ID")?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut title = row_to_title_mysql(&row);
    let mut genres = load_genres_mysql(pool, &[id]).await?;
    title.genre = genres.remove(&id).unwrap_or_default();
    Ok(Some(title))
}

async fn update_title_mysql(pool: &MySqlPool, title: &Title) -> Result<Title> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query(
        r#"
        UPDATE titles
        SET name = ?, year = ?, description = ?, category_id = ?
        WHERE id = ?
        "#,
    )
    .bind(&title.name)
    .bind(title.year)
    .bind(&title.description)
    .bind(title.category.as_ref().map(|c| c.id))
    .bind(title.id)
    .execute(&mut *tx)
    .await
    .context("Failed to update title")?;

    sqlx::query("DELETE FROM title_genres WHERE title_id = ?")
        .bind(title.id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear title genres")?;

    for genre in &title.genre {
        sqlx::query("INSERT INTO title_genres (title_id, genre_id) VALUES (?, ?)")
            .bind(title.id)
            .bind(genre.id)
            .execute(&mut *tx)
            .await
            .context("Failed to link genre to title")?;
    }

    tx.commit().await.context("Failed to commit title update")?;

    Ok(title.clone())
}

async fn delete_title_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM titles WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete title")?;

    Ok(result.rows_affected() > 0)
}

async fn list_titles_mysql(
    pool: &MySqlPool,
    filter: &TitleFilter,
    params: &ListParams,
) -> Result<(Vec<Title>, i64)> {
    let pattern = contains_pattern(filter.name.as_deref());

    let rows = sqlx::query(&format!(
        "{} {} ORDER BY t.id LIMIT ? OFFSET ?",
        TITLE_SELECT, TITLE_FILTER
    ))
    .bind(&filter.category)
    .bind(&filter.category)
    .bind(&filter.genre)
    .bind(&filter.genre)
    .bind(filter.year)
    .bind(filter.year)
    .bind(&pattern)
    .bind(&pattern)
    .bind(params.limit)
    .bind(params.offset)
    .fetch_all(pool)
    .await
    .context("Failed to list titles")?;

    let total: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM titles t LEFT JOIN categories c ON c.id = t.category_id {}",
        TITLE_FILTER
    ))
    .bind(&filter.category)
    .bind(&filter.category)
    .bind(&filter.genre)
    .bind(&filter.genre)
    .bind(filter.year)
    .bind(filter.year)
    .bind(&pattern)
    .bind(&pattern)
    .fetch_one(pool)
    .await
    .context("Failed to count titles")?;

    let mut titles: Vec<Title> = rows.iter().map(row_to_title_mysql).collect();
    let ids: Vec<i64> = titles.iter().map(|t| t.id).collect();
    let mut genres = load_genres_mysql(pool, &ids).await?;
    for title in &mut titles {
        title.genre = genres.remove(&title.id).unwrap_or_default();
    }

    Ok((titles, total))
}

async fn refresh_rating_mysql(pool: &MySqlPool, id: i64) -> Result<Option<i32>> {
    sqlx::query(
        r#"
        UPDATE titles
        SET rating = (SELECT ROUND(AVG(score)) FROM reviews WHERE title_id = ?)
        WHERE id = ?
        "#,
    )
    .bind(id)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update title rating")?;

    let rating: Option<Option<i32>> = sqlx::query_scalar("SELECT rating FROM titles WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to read title rating")?;

    Ok(rating.flatten())
}

async fn load_genres_mysql(pool: &MySqlPool, title_ids: &[i64]) -> Result<HashMap<i64, Vec<Taxon>>> {
    let mut genres: HashMap<i64, Vec<Taxon>> = HashMap::new();
    if title_ids.is_empty() {
        return Ok(genres);
    }

    let sql = genre_query(title_ids.len());
    let mut query = sqlx::query(&sql);
    for id in title_ids {
        query = query.bind(*id);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to load title genres")?;

    for row in rows {
        genres.entry(row.get("title_id")).or_default().push(Taxon {
            id: row.get("id"),
            name: row.get("name"),
            slug: row.get("slug"),
        });
    }
    Ok(genres)
}

fn row_to_title_mysql(row: &sqlx::mysql::MySqlRow) -> Title {
    let category_id: Option<i64> = row.get("category_id");

    Title {
        id: row.get("id"),
        name: row.get("name"),
        year: row.get("year"),
        description: row.get("description"),
        category: category_id.map(|id| Taxon {
            id,
            name: row.get("category_name"),
            slug: row.get("category_slug"),
        }),
        genre: Vec::new(),
        rating: row.get("rating"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxTaxonomyRepository, TaxonomyRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::TaxonomyKind;

    struct Fixture {
        titles: SqlxTitleRepository,
        categories: SqlxTaxonomyRepository,
        genres: SqlxTaxonomyRepository,
    }

    async fn setup() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        Fixture {
            titles: SqlxTitleRepository::new(pool.clone()),
            categories: SqlxTaxonomyRepository::new(pool.clone(), TaxonomyKind::Category),
            genres: SqlxTaxonomyRepository::new(pool, TaxonomyKind::Genre),
        }
    }

    async fn seed_title(fx: &Fixture, name: &str, year: i32, category: Option<&Taxon>, genres: &[&Taxon]) -> Title {
        let mut title = Title::new(name.to_string(), year);
        title.category = category.cloned();
        title.genre = genres.iter().map(|g| (*g).clone()).collect();
        fx.titles.create(&title).await.expect("Failed to create title")
    }

    #[tokio::test]
    async fn test_create_and_get_with_relations() {
        let fx = setup().await;
        let film = fx.categories.create(&Taxon::new("Film", "film")).await.unwrap();
        let drama = fx.genres.create(&Taxon::new("Drama", "drama")).await.unwrap();
        let comedy = fx.genres.create(&Taxon::new("Comedy", "comedy")).await.unwrap();

        let created = seed_title(&fx, "Amelie", 2001, Some(&film), &[&drama, &comedy]).await;
        assert!(created.id > 0);

        let found = fx.titles.get_by_id(created.id).await.unwrap().expect("Title not found");
        assert_eq!(found.name, "Amelie");
        assert_eq!(found.category.as_ref().map(|c| c.slug.as_str()), Some("film"));
        let slugs: Vec<_> = found.genre.iter().map(|g| g.slug.as_str()).collect();
        assert_eq!(slugs, vec!["comedy", "drama"]);
        assert!(found.rating.is_none());
    }

    #[tokio::test]
    async fn test_get_missing_title() {
        let fx = setup().await;
        assert!(fx.titles.get_by_id(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_replaces_genres() {
        let fx = setup().await;
        let drama = fx.genres.create(&Taxon::new("Drama", "drama")).await.unwrap();
        let noir = fx.genres.create(&Taxon::new("Noir", "noir")).await.unwrap();
        let mut title = seed_title(&fx, "Heat", 1995, None, &[&drama]).await;

        title.name = "Heat (1995)".to_string();
        title.genre = vec![noir.clone()];
        fx.titles.update(&title).await.expect("Failed to update title");

        let found = fx.titles.get_by_id(title.id).await.unwrap().unwrap();
        assert_eq!(found.name, "Heat (1995)");
        assert_eq!(found.genre, vec![noir]);
    }

    #[tokio::test]
    async fn test_deleting_category_clears_reference() {
        let fx = setup().await;
        let film = fx.categories.create(&Taxon::new("Film", "film")).await.unwrap();
        let title = seed_title(&fx, "Alien", 1979, Some(&film), &[]).await;

        fx.categories.delete_by_slug("film").await.unwrap();

        let found = fx.titles.get_by_id(title.id).await.unwrap().unwrap();
        assert!(found.category.is_none());
    }

    #[tokio::test]
    async fn test_refresh_rating_without_reviews() {
        let fx = setup().await;
        let title = seed_title(&fx, "Up", 2009, None, &[]).await;

        assert_eq!(fx.titles.refresh_rating(title.id).await.unwrap(), None);
        assert_eq!(fx.titles.get_by_id(title.id).await.unwrap().unwrap().rating, None);
        assert_eq!(fx.titles.refresh_rating(title.id + 100).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_name_filter_matches_wildcards_literally() {
        let fx = setup().await;
        seed_title(&fx, "Up", 2009, None, &[]).await;
        seed_title(&fx, "100% Wolf", 2020, None, &[]).await;
        seed_title(&fx, "Snake_Eyes", 1998, None, &[]).await;

        let percent = TitleFilter { name: Some("%".to_string()), ..Default::default() };
        let (found, total) = fx.titles.list(&percent, &ListParams::default()).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(found[0].name, "100% Wolf");

        let underscore = TitleFilter { name: Some("_".to_string()), ..Default::default() };
        let (found, total) = fx.titles.list(&underscore, &ListParams::default()).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(found[0].name, "Snake_Eyes");
    }

    #[tokio::test]
    async fn test_list_filters() {
        let fx = setup().await;
        let film = fx.categories.create(&Taxon::new("Film", "film")).await.unwrap();
        let book = fx.categories.create(&Taxon::new("Book", "book")).await.unwrap();
        let scifi = fx.genres.create(&Taxon::new("Sci-Fi", "sci-fi")).await.unwrap();
        let drama = fx.genres.create(&Taxon::new("Drama", "drama")).await.unwrap();

        seed_title(&fx, "Solaris", 1972, Some(&film), &[&scifi, &drama]).await;
        seed_title(&fx, "Solaris", 1961, Some(&book), &[&scifi]).await;
        seed_title(&fx, "Stalker", 1979, Some(&film), &[&scifi]).await;
        seed_title(&fx, "Mirror", 1975, Some(&film), &[&drama]).await;

        let all = TitleFilter::default();
        let (titles, total) = fx.titles.list(&all, &ListParams::default()).await.unwrap();
        assert_eq!(total, 4);
        assert_eq!(titles.len(), 4);

        let films = TitleFilter { category: Some("film".to_string()), ..Default::default() };
        assert_eq!(fx.titles.list(&films, &ListParams::default()).await.unwrap().1, 3);

        let film_dramas = TitleFilter {
            category: Some("film".to_string()),
            genre: Some("drama".to_string()),
            ..Default::default()
        };
        let (found, total) = fx.titles.list(&film_dramas, &ListParams::default()).await.unwrap();
        assert_eq!(total, 2);
        assert!(found.iter().all(|t| t.genre.iter().any(|g| g.slug == "drama")));

        let by_year = TitleFilter { year: Some(1961), ..Default::default() };
        let (found, _) = fx.titles.list(&by_year, &ListParams::default()).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].category.as_ref().unwrap().slug, "book");

        let by_name = TitleFilter { name: Some("lari".to_string()), ..Default::default() };
        assert_eq!(fx.titles.list(&by_name, &ListParams::default()).await.unwrap().1, 2);

        let window = ListParams::new(Some(1), Some(1));
        let (page, total) = fx.titles.list(&all, &window).await.unwrap();
        assert_eq!(total, 4);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].year, 1961);
    }

    #[tokio::test]
    async fn test_delete_title() {
        let fx = setup().await;
        let title = seed_title(&fx, "Up", 2009, None, &[]).await;

        assert!(fx.titles.delete(title.id).await.unwrap());
        assert!(!fx.titles.delete(title.id).await.unwrap());
    }
}
