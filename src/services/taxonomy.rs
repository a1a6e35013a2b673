//! Category and genre service
//!
//! Categories and genres are flat name/slug pairs that can be listed,
//! created and deleted. One service instance handles one kind.

use crate::cache::{Cache, CacheLayer};
use crate::db::is_unique_violation;
use crate::db::repositories::TaxonomyRepository;
use crate::models::{ListParams, PagedResult, Taxon, TaxonomyKind};
use crate::services::rating::TITLE_CACHE_PREFIX;
use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

pub const SLUG_MAX_LEN: usize = 50;
pub const NAME_MAX_LEN: usize = 256;

static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("valid regex"));

/// Error types for category/genre operations
#[derive(Debug, thiserror::Error)]
pub enum TaxonomyServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Slug already in use
    #[error("Duplicate slug: {0}")]
    DuplicateSlug(String),

    #[error("{0} not found: {1}")]
    NotFound(TaxonomyKind, String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Check a slug's alphabet and length
pub fn validate_slug(slug: &str) -> Result<(), TaxonomyServiceError> {
    if slug.is_empty() || slug.len() > SLUG_MAX_LEN {
        return Err(TaxonomyServiceError::ValidationError(format!(
            "slug: must be 1 to {} characters",
            SLUG_MAX_LEN
        )));
    }
    if !SLUG_RE.is_match(slug) {
        return Err(TaxonomyServiceError::ValidationError(
            "slug: only letters, digits, hyphens and underscores are allowed".to_string(),
        ));
    }
    Ok(())
}

/// Service for one taxonomy kind
pub struct TaxonomyService {
    repo: Arc<dyn TaxonomyRepository>,
    cache: Arc<Cache>,
}

impl TaxonomyService {
    pub fn new(repo: Arc<dyn TaxonomyRepository>, cache: Arc<Cache>) -> Self {
        Self { repo, cache }
    }

    pub fn kind(&self) -> TaxonomyKind {
        self.repo.kind()
    }

    pub async fn list(
        &self,
        search: Option<&str>,
        params: &ListParams,
    ) -> Result<PagedResult<Taxon>, TaxonomyServiceError> {
        let (items, total) = self
            .repo
            .list(search, params)
            .await
            .with_context(|| format!("Failed to list {}", self.kind().table()))?;
        Ok(PagedResult::new(items, total, params))
    }

    pub async fn create(&self, name: &str, slug: &str) -> Result<Taxon, TaxonomyServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TaxonomyServiceError::ValidationError("name: cannot be empty".to_string()));
        }
        if name.chars().count() > NAME_MAX_LEN {
            return Err(TaxonomyServiceError::ValidationError(format!(
                "name: at most {} characters",
                NAME_MAX_LEN
            )));
        }
        validate_slug(slug)?;

        match self.repo.create(&Taxon::new(name, slug)).await {
            Ok(created) => {
                tracing::info!(kind = %self.kind(), slug = %created.slug, "Created");
                Ok(created)
            }
            Err(e) if is_unique_violation(&e) => Err(TaxonomyServiceError::DuplicateSlug(slug.to_string())),
            Err(e) => Err(e.context("Failed to create taxonomy entry").into()),
        }
    }

    pub async fn delete(&self, slug: &str) -> Result<(), TaxonomyServiceError> {
        let deleted = self
            .repo
            .delete_by_slug(slug)
            .await
            .context("Failed to delete taxonomy entry")?;
        if !deleted {
            return Err(TaxonomyServiceError::NotFound(self.kind(), slug.to_string()));
        }

        // Cached title details embed the deleted entry
        if let Err(e) = self.cache.delete_prefix(TITLE_CACHE_PREFIX).await {
            tracing::warn!("Failed to invalidate title cache: {}", e);
        }
        tracing::info!(kind = %self.kind(), slug = %slug, "Deleted");
        Ok(())
    }
}
