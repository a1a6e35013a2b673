//! Services layer - Business logic
//!
//! Services are responsible for:
//! - Implementing business rules and input validation
//! - Coordinating between repositories and cache
//! - Translating storage failures into typed errors

pub mod comment;
pub mod email;
pub mod rating;
pub mod review;
pub mod taxonomy;
pub mod title;
pub mod user;

pub use comment::{CommentService, CommentServiceError};
pub use email::{create_mailer, ConsoleMailer, Mailer, SmtpMailer};
pub use rating::RatingAggregator;
pub use review::{ReviewService, ReviewServiceError};
pub use taxonomy::{TaxonomyService, TaxonomyServiceError};
pub use title::{TitleService, TitleServiceError};
pub use user::{SignupInput, UserService, UserServiceError};
