//! Title model

use serde::{Deserialize, Deserializer, Serialize};

use super::taxonomy::{Category, Genre};

/// A reviewable work (film, book, album, ...)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Title {
    pub id: i64,
    pub name: String,
    /// Release year
    pub year: i32,
    pub description: Option<String>,
    /// Owning category; cleared when the category is deleted
    pub category: Option<Category>,
    pub genre: Vec<Genre>,
    /// Rounded mean of the review scores, `None` while unreviewed
    pub rating: Option<i32>,
}

impl Title {
    /// Create a new unrated title
    pub fn new(name: String, year: i32) -> Self {
        Self {
            id: 0,
            name,
            year,
            description: None,
            category: None,
            genre: Vec::new(),
            rating: None,
        }
    }
}

/// Input for creating a title. Category and genres are referenced by slug.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTitleInput {
    pub name: String,
    pub year: i32,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub genre: Vec<String>,
}

/// Partial update. `None` leaves the field unchanged; for the nullable
/// fields `Some(None)` (an explicit JSON `null`) clears the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTitleInput {
    pub name: Option<String>,
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub category: Option<Option<String>>,
    pub genre: Option<Vec<String>>,
}

/// Distinguish a field sent as `null` from one that was left out
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Title list filters, all optional and combined with AND
#[derive(Debug, Clone, Default)]
pub struct TitleFilter {
    /// Category slug
    pub category: Option<String>,
    /// Genre slug
    pub genre: Option<String>,
    pub year: Option<i32>,
    /// Substring of the name
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Taxon;

    #[test]
    fn test_serialized_shape() {
        let mut title = Title::new("Solaris".to_string(), 1972);
        title.id = 3;
        title.category = Some(Taxon::new("Film", "film"));
        title.genre = vec![Taxon::new("Sci-Fi", "sci-fi")];

        let json = serde_json::to_value(&title).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["category"]["slug"], "film");
        assert_eq!(json["genre"][0]["name"], "Sci-Fi");
        assert!(json["rating"].is_null());
        assert!(json["description"].is_null());
    }

    #[test]
    fn test_update_input_null_versus_missing() {
        let cleared: UpdateTitleInput = serde_json::from_value(serde_json::json!({"category": null})).unwrap();
        assert_eq!(cleared.category, Some(None));
        assert_eq!(cleared.description, None);

        let set: UpdateTitleInput =
            serde_json::from_value(serde_json::json!({"category": "film", "description": null})).unwrap();
        assert_eq!(set.category, Some(Some("film".to_string())));
        assert_eq!(set.description, Some(None));

        let untouched: UpdateTitleInput = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(untouched.category, None);
    }
}
