//! Title service
//!
//! Titles reference their category and genres by slug on write; the service
//! resolves slugs to stored entries before touching the title tables. Title
//! detail reads go through the cache, which the rating aggregator and every
//! write here invalidate.

use crate::cache::{Cache, CacheLayer};
use crate::db::repositories::{TaxonomyRepository, TitleRepository};
use crate::models::{
    CreateTitleInput, ListParams, PagedResult, Taxon, Title, TitleFilter, UpdateTitleInput,
};
use crate::services::rating::title_cache_key;
use anyhow::Context;
use chrono::{Datelike, Utc};
use std::sync::Arc;

pub const NAME_MAX_LEN: usize = 256;

/// Error types for title operations
#[derive(Debug, thiserror::Error)]
pub enum TitleServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Title not found: {0}")]
    NotFound(i64),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

fn validate_name(name: &str) -> Result<(), TitleServiceError> {
    if name.trim().is_empty() {
        return Err(TitleServiceError::ValidationError("name: cannot be empty".to_string()));
    }
    if name.chars().count() > NAME_MAX_LEN {
        return Err(TitleServiceError::ValidationError(format!(
            "name: at most {} characters",
            NAME_MAX_LEN
        )));
    }
    Ok(())
}

/// A title cannot be released in the future
pub fn validate_year(year: i32) -> Result<(), TitleServiceError> {
    let current = Utc::now().year();
    if year > current {
        return Err(TitleServiceError::ValidationError(format!(
            "year: cannot be later than {}",
            current
        )));
    }
    Ok(())
}

/// Service for managing titles
pub struct TitleService {
    title_repo: Arc<dyn TitleRepository>,
    category_repo: Arc<dyn TaxonomyRepository>,
    genre_repo: Arc<dyn TaxonomyRepository>,
    cache: Arc<Cache>,
}

impl TitleService {
    pub fn new(
        title_repo: Arc<dyn TitleRepository>,
        category_repo: Arc<dyn TaxonomyRepository>,
        genre_repo: Arc<dyn TaxonomyRepository>,
        cache: Arc<Cache>,
    ) -> Self {
        Self {
            title_repo,
            category_repo,
            genre_repo,
            cache,
        }
    }

    pub async fn list(
        &self,
        filter: &TitleFilter,
        params: &ListParams,
    ) -> Result<PagedResult<Title>, TitleServiceError> {
        let (titles, total) = self
            .title_repo
            .list(filter, params)
            .await
            .context("Failed to list titles")?;
        Ok(PagedResult::new(titles, total, params))
    }

    /// Get a title by ID, served from cache when possible
    pub async fn get(&self, id: i64) -> Result<Title, TitleServiceError> {
        let key = title_cache_key(id);
        if let Ok(Some(title)) = self.cache.get::<Title>(&key).await {
            return Ok(title);
        }
        let generation = self.cache.generation();

        let title = self
            .title_repo
            .get_by_id(id)
            .await
            .context("Failed to get title")?
            .ok_or(TitleServiceError::NotFound(id))?;

        if let Err(e) = self
            .cache
            .fill(&key, &title, self.cache.default_ttl(), generation)
            .await
        {
            tracing::warn!("Failed to cache title {}: {}", id, e);
        }
        Ok(title)
    }

    pub async fn create(&self, input: CreateTitleInput) -> Result<Title, TitleServiceError> {
        validate_name(&input.name)?;
        validate_year(input.year)?;

        let mut title = Title::new(input.name, input.year);
        title.description = input.description;
        title.category = match input.category {
            Some(slug) => Some(self.resolve_category(&slug).await?),
            None => None,
        };
        title.genre = self.resolve_genres(&input.genre).await?;

        let created = self
            .title_repo
            .create(&title)
            .await
            .context("Failed to create title")?;

        tracing::info!(title_id = created.id, name = %created.name, "Title created");
        Ok(created)
    }

    /// Partial update. Fields left `None` keep their stored value; an explicit
    /// null clears the category or description.
    pub async fn update(&self, id: i64, input: UpdateTitleInput) -> Result<Title, TitleServiceError> {
        let mut title = self
            .title_repo
            .get_by_id(id)
            .await
            .context("Failed to get title")?
            .ok_or(TitleServiceError::NotFound(id))?;

        if let Some(name) = input.name {
            validate_name(&name)?;
            title.name = name;
        }
        if let Some(year) = input.year {
            validate_year(year)?;
            title.year = year;
        }
        if let Some(description) = input.description {
            title.description = description;
        }
        match input.category {
            Some(Some(slug)) => title.category = Some(self.resolve_category(&slug).await?),
            Some(None) => title.category = None,
            None => {}
        }
        if let Some(slugs) = input.genre {
            title.genre = self.resolve_genres(&slugs).await?;
        }

        let updated = self
            .title_repo
            .update(&title)
            .await
            .context("Failed to update title")?;

        self.invalidate(id).await;
        Ok(updated)
    }

    /// Delete a title with its reviews and comments
    pub async fn delete(&self, id: i64) -> Result<(), TitleServiceError> {
        let deleted = self
            .title_repo
            .delete(id)
            .await
            .context("Failed to delete title")?;
        if !deleted {
            return Err(TitleServiceError::NotFound(id));
        }

        self.invalidate(id).await;
        tracing::info!(title_id = id, "Title deleted");
        Ok(())
    }

    async fn resolve_category(&self, slug: &str) -> Result<Taxon, TitleServiceError> {
        self.category_repo
            .get_by_slug(slug)
            .await
            .context("Failed to resolve category")?
            .ok_or_else(|| TitleServiceError::ValidationError(format!("category: unknown slug '{}'", slug)))
    }

    async fn resolve_genres(&self, slugs: &[String]) -> Result<Vec<Taxon>, TitleServiceError> {
        let mut genres: Vec<Taxon> = Vec::with_capacity(slugs.len());
        for slug in slugs {
            if genres.iter().any(|g| &g.slug == slug) {
                continue;
            }
            let genre = self
                .genre_repo
                .get_by_slug(slug)
                .await
                .context("Failed to resolve genre")?
                .ok_or_else(|| TitleServiceError::ValidationError(format!("genre: unknown slug '{}'", slug)))?;
            genres.push(genre);
        }
        Ok(genres)
    }

    async fn invalidate(&self, id: i64) {
        if let Err(e) = self.cache.delete(&title_cache_key(id)).await {
            tracing::warn!("Failed to invalidate title cache: {}", e);
        }
    }
}
