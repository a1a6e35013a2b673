//! Comment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A reply attached to a review
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub id: i64,
    #[serde(rename = "review")]
    pub review_id: i64,
    #[serde(skip_serializing, default)]
    pub author_id: i64,
    /// Author username
    pub author: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
}
