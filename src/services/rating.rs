//! Title rating aggregation
//!
//! A title's rating is the mean of its current review scores, rounded to the
//! nearest integer with halves rounded up (7.5 becomes 8). It is stored on the
//! title and recomputed after every review write. The database aggregates and
//! stores the value in a single statement, so concurrent review writes on one
//! title always leave the rating of the scores that were last committed.

use crate::cache::{Cache, CacheLayer};
use crate::db::repositories::{ReviewRepository, TitleRepository};
use anyhow::{Context, Result};
use std::sync::Arc;

/// Prefix shared by every cached title detail
pub const TITLE_CACHE_PREFIX: &str = "title:id:";

/// Cache key of a title detail entry
pub fn title_cache_key(title_id: i64) -> String {
    format!("{}{}", TITLE_CACHE_PREFIX, title_id)
}

/// Recomputes and persists title ratings
pub struct RatingAggregator {
    title_repo: Arc<dyn TitleRepository>,
    review_repo: Arc<dyn ReviewRepository>,
    cache: Arc<Cache>,
}

impl RatingAggregator {
    pub fn new(
        title_repo: Arc<dyn TitleRepository>,
        review_repo: Arc<dyn ReviewRepository>,
        cache: Arc<Cache>,
    ) -> Self {
        Self {
            title_repo,
            review_repo,
            cache,
        }
    }

    /// Recompute the rating of `title_id` from its current reviews and store it
    pub async fn recompute(&self, title_id: i64) -> Result<Option<i32>> {
        let rating = self
            .title_repo
            .refresh_rating(title_id)
            .await
            .context("Failed to store rating")?;

        if let Err(e) = self.cache.delete(&title_cache_key(title_id)).await {
            tracing::warn!("Failed to invalidate title cache: {}", e);
        }

        tracing::debug!(title_id, ?rating, "Rating recomputed");
        Ok(rating)
    }

    /// Titles whose rating depends on a review by `author_id`
    pub async fn titles_reviewed_by(&self, author_id: i64) -> Result<Vec<i64>> {
        self.review_repo
            .titles_reviewed_by(author_id)
            .await
            .context("Failed to load reviewed titles")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxReviewRepository, SqlxTitleRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{Review, Title, User, UserRole};
    use chrono::Utc;
    use proptest::prelude::*;

    /// Reference rounding: mean with halves away from zero
    fn mean_score(scores: &[i32]) -> Option<i32> {
        if scores.is_empty() {
            return None;
        }
        let sum: i64 = scores.iter().map(|&s| i64::from(s)).sum();
        Some((sum as f64 / scores.len() as f64).round() as i32)
    }

    #[test]
    fn test_mean_score_examples() {
        assert_eq!(mean_score(&[]), None);
        assert_eq!(mean_score(&[8, 6]), Some(7));
        assert_eq!(mean_score(&[8, 7]), Some(8));
        assert_eq!(mean_score(&[10]), Some(10));
        assert_eq!(mean_score(&[1, 2, 2]), Some(2));
        assert_eq!(mean_score(&[1, 1, 2]), Some(1));
    }

    #[test]
    fn test_title_cache_key() {
        assert_eq!(title_cache_key(42), "title:id:42");
        assert!(title_cache_key(42).starts_with(TITLE_CACHE_PREFIX));
    }

    proptest! {
        #[test]
        fn prop_mean_within_score_range(scores in prop::collection::vec(1i32..=10, 1..50)) {
            let rating = mean_score(&scores).unwrap();
            let min = *scores.iter().min().unwrap();
            let max = *scores.iter().max().unwrap();
            prop_assert!(rating >= min && rating <= max);
        }

        #[test]
        fn prop_mean_close_to_exact(scores in prop::collection::vec(1i32..=10, 1..50)) {
            let exact = scores.iter().sum::<i32>() as f64 / scores.len() as f64;
            let rating = mean_score(&scores).unwrap() as f64;
            prop_assert!((rating - exact).abs() <= 0.5);
        }
    }

    #[tokio::test]
    async fn test_stored_rating_matches_rounding() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let titles = SqlxTitleRepository::boxed(pool.clone());
        let reviews = SqlxReviewRepository::boxed(pool.clone());
        let users = SqlxUserRepository::boxed(pool);
        let aggregator = RatingAggregator::new(titles.clone(), reviews.clone(), Arc::new(Cache::new()));

        let cases: &[&[i32]] = &[&[8, 7], &[8, 6], &[1, 2], &[9, 10], &[1, 1, 2], &[1, 10, 10, 1, 5, 6], &[3]];
        for (n, scores) in cases.iter().enumerate() {
            let title = titles
                .create(&Title::new(format!("Case {}", n), 2000))
                .await
                .unwrap();
            for (i, &score) in scores.iter().enumerate() {
                let name = format!("critic{}x{}", n, i);
                let author = users
                    .create(&User::new(name.clone(), format!("{}@example.com", name), UserRole::User))
                    .await
                    .unwrap();
                reviews
                    .create(&Review {
                        id: 0,
                        title_id: title.id,
                        author_id: author.id,
                        author: author.username.clone(),
                        text: "Noted".to_string(),
                        score,
                        pub_date: Utc::now(),
                    })
                    .await
                    .unwrap();
            }

            let rating = aggregator.recompute(title.id).await.unwrap();
            assert_eq!(rating, mean_score(scores), "scores {:?}", scores);
            assert_eq!(titles.get_by_id(title.id).await.unwrap().unwrap().rating, rating);
        }
    }
}
