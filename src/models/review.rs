//! Review model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lowest accepted score
pub const MIN_SCORE: i32 = 1;
/// Highest accepted score
pub const MAX_SCORE: i32 = 10;

/// A user's scored opinion of a title. One per (title, author).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: i64,
    #[serde(rename = "title")]
    pub title_id: i64,
    #[serde(skip_serializing, default)]
    pub author_id: i64,
    /// Author username
    pub author: String,
    pub text: String,
    pub score: i32,
    pub pub_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateReviewInput {
    pub text: String,
    pub score: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateReviewInput {
    pub text: Option<String>,
    pub score: Option<i32>,
}

pub fn is_valid_score(score: i32) -> bool {
    (MIN_SCORE..=MAX_SCORE).contains(&score)
}
