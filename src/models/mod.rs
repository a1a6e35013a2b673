//! Data models
//!
//! Database entities and the input types the services accept.

mod comment;
mod pagination;
mod review;
mod taxonomy;
mod title;
mod token;
mod user;

pub use comment::Comment;
pub use pagination::{ListParams, PagedResult, DEFAULT_LIMIT, MAX_LIMIT};
pub use review::{is_valid_score, CreateReviewInput, Review, UpdateReviewInput, MAX_SCORE, MIN_SCORE};
pub use taxonomy::{Category, Genre, Taxon, TaxonomyKind};
pub use title::{CreateTitleInput, Title, TitleFilter, UpdateTitleInput};
pub use token::AccessToken;
pub use user::{CreateUserInput, UpdateUserInput, User, UserRole};
