//! Comment service

use crate::db::repositories::{CommentRepository, ReviewRepository};
use crate::models::{Comment, ListParams, PagedResult, User};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

/// Error types for comment operations
#[derive(Debug, thiserror::Error)]
pub enum CommentServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

fn validate_text(text: &str) -> Result<(), CommentServiceError> {
    if text.trim().is_empty() {
        return Err(CommentServiceError::ValidationError("text: cannot be empty".to_string()));
    }
    Ok(())
}

/// Service for managing comments on reviews
pub struct CommentService {
    comment_repo: Arc<dyn CommentRepository>,
    review_repo: Arc<dyn ReviewRepository>,
}

impl CommentService {
    pub fn new(comment_repo: Arc<dyn CommentRepository>, review_repo: Arc<dyn ReviewRepository>) -> Self {
        Self {
            comment_repo,
            review_repo,
        }
    }

    /// The review must exist and belong to the title
    async fn ensure_review(&self, title_id: i64, review_id: i64) -> Result<(), CommentServiceError> {
        self.review_repo
            .get(title_id, review_id)
            .await
            .context("Failed to get review")?
            .map(|_| ())
            .ok_or_else(|| CommentServiceError::NotFound(format!("review {}", review_id)))
    }

    pub async fn list(
        &self,
        title_id: i64,
        review_id: i64,
        params: &ListParams,
    ) -> Result<PagedResult<Comment>, CommentServiceError> {
        self.ensure_review(title_id, review_id).await?;
        let (comments, total) = self
            .comment_repo
            .list_by_review(review_id, params)
            .await
            .context("Failed to list comments")?;
        Ok(PagedResult::new(comments, total, params))
    }

    pub async fn get(&self, title_id: i64, review_id: i64, comment_id: i64) -> Result<Comment, CommentServiceError> {
        self.ensure_review(title_id, review_id).await?;
        self.comment_repo
            .get(review_id, comment_id)
            .await
            .context("Failed to get comment")?
            .ok_or_else(|| CommentServiceError::NotFound(format!("comment {}", comment_id)))
    }

    pub async fn create(
        &self,
        title_id: i64,
        review_id: i64,
        author: &User,
        text: String,
    ) -> Result<Comment, CommentServiceError> {
        validate_text(&text)?;
        self.ensure_review(title_id, review_id).await?;

        let comment = Comment {
            id: 0,
            review_id,
            author_id: author.id,
            author: author.username.clone(),
            text,
            pub_date: Utc::now(),
        };

        let created = self
            .comment_repo
            .create(&comment)
            .await
            .context("Failed to create comment")?;

        tracing::debug!(review_id, comment_id = created.id, "Comment created");
        Ok(created)
    }

    /// Replace the text of an already loaded comment
    pub async fn update(&self, mut comment: Comment, text: Option<String>) -> Result<Comment, CommentServiceError> {
        if let Some(text) = text {
            validate_text(&text)?;
            comment.text = text;
        }

        let updated = self
            .comment_repo
            .update(&comment)
            .await
            .context("Failed to update comment")?;
        Ok(updated)
    }

    pub async fn delete(&self, comment: &Comment) -> Result<(), CommentServiceError> {
        let deleted = self
            .comment_repo
            .delete(comment.id)
            .await
            .context("Failed to delete comment")?;
        if !deleted {
            return Err(CommentServiceError::NotFound(format!("comment {}", comment.id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        SqlxCommentRepository, SqlxReviewRepository, SqlxTitleRepository, SqlxUserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{Review, Title, UserRole};

    struct Fixture {
        service: CommentService,
        author: User,
        title_id: i64,
        other_title_id: i64,
        review_id: i64,
    }

    async fn setup() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::boxed(pool.clone());
        let titles = SqlxTitleRepository::boxed(pool.clone());
        let reviews = SqlxReviewRepository::boxed(pool.clone());

        let author = users
            .create(&User::new("alice".to_string(), "alice@example.com".to_string(), UserRole::User))
            .await
            .unwrap();
        let title = titles.create(&Title::new("Up".to_string(), 2009)).await.unwrap();
        let other = titles.create(&Title::new("Cars".to_string(), 2006)).await.unwrap();
        let review = reviews
            .create(&Review {
                id: 0,
                title_id: title.id,
                author_id: author.id,
                author: author.username.clone(),
                text: "Great".to_string(),
                score: 9,
                pub_date: Utc::now(),
            })
            .await
            .unwrap();

        Fixture {
            service: CommentService::new(SqlxCommentRepository::boxed(pool), reviews),
            author,
            title_id: title.id,
            other_title_id: other.id,
            review_id: review.id,
        }
    }

    #[tokio::test]
    async fn test_create_update_delete() {
        let fx = setup().await;

        let created = fx
            .service
            .create(fx.title_id, fx.review_id, &fx.author, "Agreed".to_string())
            .await
            .unwrap();
        assert_eq!(created.author, "alice");

        let updated = fx.service.update(created, Some("Fully agreed".to_string())).await.unwrap();
        let fetched = fx.service.get(fx.title_id, fx.review_id, updated.id).await.unwrap();
        assert_eq!(fetched.text, "Fully agreed");

        fx.service.delete(&fetched).await.unwrap();
        assert!(matches!(
            fx.service.get(fx.title_id, fx.review_id, fetched.id).await,
            Err(CommentServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_review_must_belong_to_title() {
        let fx = setup().await;

        assert!(matches!(
            fx.service
                .create(fx.other_title_id, fx.review_id, &fx.author, "Hi".to_string())
                .await,
            Err(CommentServiceError::NotFound(_))
        ));
        assert!(matches!(
            fx.service.list(fx.other_title_id, fx.review_id, &ListParams::default()).await,
            Err(CommentServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let fx = setup().await;

        assert!(matches!(
            fx.service.create(fx.title_id, fx.review_id, &fx.author, "".to_string()).await,
            Err(CommentServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_list() {
        let fx = setup().await;
        for text in ["one", "two", "three"] {
            fx.service
                .create(fx.title_id, fx.review_id, &fx.author, text.to_string())
                .await
                .unwrap();
        }

        let page = fx
            .service
            .list(fx.title_id, fx.review_id, &ListParams::new(Some(2), None))
            .await
            .unwrap();
        assert_eq!(page.count, 3);
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[0].text, "one");
    }
}
