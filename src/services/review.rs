//! Review service
//!
//! Every successful create, update or delete recomputes the title's rating
//! before returning.

use crate::db::is_unique_violation;
use crate::db::repositories::{ReviewRepository, TitleRepository};
use crate::models::{
    is_valid_score, CreateReviewInput, ListParams, PagedResult, Review, UpdateReviewInput, User,
    MAX_SCORE, MIN_SCORE,
};
use crate::services::rating::RatingAggregator;
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

/// Error types for review operations
#[derive(Debug, thiserror::Error)]
pub enum ReviewServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The author already reviewed this title
    #[error("You have already reviewed this title")]
    DuplicateReview,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

fn validate_text(text: &str) -> Result<(), ReviewServiceError> {
    if text.trim().is_empty() {
        return Err(ReviewServiceError::ValidationError("text: cannot be empty".to_string()));
    }
    Ok(())
}

fn validate_score(score: i32) -> Result<(), ReviewServiceError> {
    if !is_valid_score(score) {
        return Err(ReviewServiceError::ValidationError(format!(
            "score: must be between {} and {}",
            MIN_SCORE, MAX_SCORE
        )));
    }
    Ok(())
}

/// Service for managing reviews
pub struct ReviewService {
    review_repo: Arc<dyn ReviewRepository>,
    title_repo: Arc<dyn TitleRepository>,
    rating: Arc<RatingAggregator>,
}

impl ReviewService {
    pub fn new(
        review_repo: Arc<dyn ReviewRepository>,
        title_repo: Arc<dyn TitleRepository>,
        rating: Arc<RatingAggregator>,
    ) -> Self {
        Self {
            review_repo,
            title_repo,
            rating,
        }
    }

    async fn ensure_title(&self, title_id: i64) -> Result<(), ReviewServiceError> {
        self.title_repo
            .get_by_id(title_id)
            .await
            .context("Failed to get title")?
            .map(|_| ())
            .ok_or_else(|| ReviewServiceError::NotFound(format!("title {}", title_id)))
    }

    pub async fn list(&self, title_id: i64, params: &ListParams) -> Result<PagedResult<Review>, ReviewServiceError> {
        self.ensure_title(title_id).await?;
        let (reviews, total) = self
            .review_repo
            .list_by_title(title_id, params)
            .await
            .context("Failed to list reviews")?;
        Ok(PagedResult::new(reviews, total, params))
    }

    /// Get a review that belongs to `title_id`
    pub async fn get(&self, title_id: i64, review_id: i64) -> Result<Review, ReviewServiceError> {
        self.review_repo
            .get(title_id, review_id)
            .await
            .context("Failed to get review")?
            .ok_or_else(|| ReviewServiceError::NotFound(format!("review {}", review_id)))
    }

    /// Publish `author`'s review of a title
    pub async fn create(
        &self,
        title_id: i64,
        author: &User,
        input: CreateReviewInput,
    ) -> Result<Review, ReviewServiceError> {
        validate_text(&input.text)?;
        validate_score(input.score)?;
        self.ensure_title(title_id).await?;

        let review = Review {
            id: 0,
            title_id,
            author_id: author.id,
            author: author.username.clone(),
            text: input.text,
            score: input.score,
            pub_date: Utc::now(),
        };

        let created = match self.review_repo.create(&review).await {
            Ok(created) => created,
            Err(e) if is_unique_violation(&e) => return Err(ReviewServiceError::DuplicateReview),
            Err(e) => return Err(e.context("Failed to create review").into()),
        };

        self.rating.recompute(title_id).await?;
        tracing::info!(title_id, review_id = created.id, author = %author.username, "Review created");
        Ok(created)
    }

    /// Apply a partial update to an already loaded review
    pub async fn update(&self, mut review: Review, input: UpdateReviewInput) -> Result<Review, ReviewServiceError> {
        if let Some(text) = input.text {
            validate_text(&text)?;
            review.text = text;
        }
        if let Some(score) = input.score {
            validate_score(score)?;
            review.score = score;
        }

        let updated = self
            .review_repo
            .update(&review)
            .await
            .context("Failed to update review")?;

        self.rating.recompute(updated.title_id).await?;
        Ok(updated)
    }

    pub async fn delete(&self, review: &Review) -> Result<(), ReviewServiceError> {
        let deleted = self
            .review_repo
            .delete(review.id)
            .await
            .context("Failed to delete review")?;
        if !deleted {
            return Err(ReviewServiceError::NotFound(format!("review {}", review.id)));
        }

        self.rating.recompute(review.title_id).await?;
        tracing::info!(title_id = review.title_id, review_id = review.id, "Review deleted");
        Ok(())
    }
}
