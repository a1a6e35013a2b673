//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod comment;
pub mod review;
pub mod taxonomy;
pub mod title;
pub mod token;
pub mod user;

pub use comment::{CommentRepository, SqlxCommentRepository};
pub use review::{ReviewRepository, SqlxReviewRepository};
pub use taxonomy::{SqlxTaxonomyRepository, TaxonomyRepository};
pub use title::{SqlxTitleRepository, TitleRepository};
pub use token::{SqlxTokenRepository, TokenRepository};
pub use user::{SqlxUserRepository, UserRepository};

/// LIKE pattern matching `term` as a literal substring, for use with
/// `LIKE ? ESCAPE '!'`. Blank terms yield `None`.
pub(crate) fn contains_pattern(term: Option<&str>) -> Option<String> {
    let term = term.map(str::trim).filter(|s| !s.is_empty())?;
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '!' | '%' | '_') {
            pattern.push('!');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    Some(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern() {
        assert_eq!(contains_pattern(None), None);
        assert_eq!(contains_pattern(Some("  ")), None);
        assert_eq!(contains_pattern(Some(" Amelie ")), Some("%Amelie%".to_string()));
        assert_eq!(contains_pattern(Some("100%")), Some("%100!%%".to_string()));
        assert_eq!(contains_pattern(Some("a_b!")), Some("%a!_b!!%".to_string()));
    }
}
