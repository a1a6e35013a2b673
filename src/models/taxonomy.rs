//! Category and genre models
//!
//! Categories and genres have the same shape (a display name plus a unique
//! slug) and are stored in separate tables. `TaxonomyKind` selects the table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A category or a genre
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Taxon {
    #[serde(skip_serializing, default)]
    pub id: i64,
    pub name: String,
    /// URL-friendly unique key
    pub slug: String,
}

pub type Category = Taxon;
pub type Genre = Taxon;

impl Taxon {
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            slug: slug.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaxonomyKind {
    Category,
    Genre,
}

impl TaxonomyKind {
    /// Backing table name
    pub fn table(self) -> &'static str {
        match self {
            TaxonomyKind::Category => "categories",
            TaxonomyKind::Genre => "genres",
        }
    }
}

impl fmt::Display for TaxonomyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaxonomyKind::Category => write!(f, "category"),
            TaxonomyKind::Genre => write!(f, "genre"),
        }
    }
}
