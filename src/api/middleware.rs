//! API middleware
//!
//! Contains:
//! - `AppState`, the shared services handed to every handler
//! - `ApiError`, the JSON error envelope
//! - Bearer token authentication
//! - Extractors for the acting user and JSON bodies

use axum::{
    extract::{FromRequest, FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;

use crate::cache::Cache;
use crate::db::repositories::{
    SqlxCommentRepository, SqlxReviewRepository, SqlxTaxonomyRepository, SqlxTitleRepository,
    SqlxTokenRepository, SqlxUserRepository,
};
use crate::db::DynDatabasePool;
use crate::models::{TaxonomyKind, User};
use crate::permissions::Decision;
use crate::services::{
    CommentService, Mailer, RatingAggregator, ReviewService, TaxonomyService, TitleService,
    UserService,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub category_service: Arc<TaxonomyService>,
    pub genre_service: Arc<TaxonomyService>,
    pub title_service: Arc<TitleService>,
    pub review_service: Arc<ReviewService>,
    pub comment_service: Arc<CommentService>,
}

impl AppState {
    /// Wire repositories and services over one database pool
    pub fn new(
        pool: DynDatabasePool,
        cache: Arc<Cache>,
        mailer: Arc<dyn Mailer>,
        token_ttl_days: i64,
    ) -> Self {
        let users = SqlxUserRepository::boxed(pool.clone());
        let tokens = SqlxTokenRepository::boxed(pool.clone());
        let categories = SqlxTaxonomyRepository::boxed(pool.clone(), TaxonomyKind::Category);
        let genres = SqlxTaxonomyRepository::boxed(pool.clone(), TaxonomyKind::Genre);
        let titles = SqlxTitleRepository::boxed(pool.clone());
        let reviews = SqlxReviewRepository::boxed(pool.clone());
        let comments = SqlxCommentRepository::boxed(pool);

        let rating = Arc::new(RatingAggregator::new(titles.clone(), reviews.clone(), cache.clone()));

        Self {
            user_service: Arc::new(
                UserService::with_token_ttl(users, tokens, mailer, token_ttl_days)
                    .with_rating(rating.clone()),
            ),
            category_service: Arc::new(TaxonomyService::new(categories.clone(), cache.clone())),
            genre_service: Arc::new(TaxonomyService::new(genres.clone(), cache.clone())),
            title_service: Arc::new(TitleService::new(titles.clone(), categories, genres, cache)),
            review_service: Arc::new(ReviewService::new(reviews.clone(), titles, rating)),
            comment_service: Arc::new(CommentService::new(comments, reviews)),
        }
    }

    /// Service for the given taxonomy
    pub fn taxonomy(&self, kind: TaxonomyKind) -> &Arc<TaxonomyService> {
        match kind {
            TaxonomyKind::Category => &self.category_service,
            TaxonomyKind::Genre => &self.genre_service,
        }
    }
}

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Validation error for a `"field: problem"` message.
    ///
    /// The field is reported under `details` so clients can attach the
    /// message to the right input.
    pub fn field_error(message: impl Into<String>) -> Self {
        let message = message.into();
        match message.split_once(": ") {
            Some((field, problem)) if !field.is_empty() && !field.contains(' ') => {
                let details = serde_json::json!({ field: [problem] });
                Self::with_details("VALIDATION_ERROR", message.clone(), details)
            }
            _ => Self::validation_error(message),
        }
    }

    /// Log the cause and hide it from the client
    pub fn internal_error(cause: impl std::fmt::Display) -> Self {
        tracing::error!("Internal error: {}", cause);
        Self::new("INTERNAL_ERROR", "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

fn credentials_missing() -> ApiError {
    ApiError::unauthorized("Authentication credentials were not provided")
}

/// Turn a permission decision into an early return
pub fn enforce(decision: Decision) -> Result<(), ApiError> {
    match decision {
        Decision::Allow => Ok(()),
        Decision::Unauthenticated => Err(credentials_missing()),
        Decision::Forbidden => Err(ApiError::forbidden(
            "You do not have permission to perform this action",
        )),
    }
}

/// Extract the bearer token from the Authorization header
fn extract_bearer_token(request: &Request) -> Option<String> {
    let auth_header = request.headers().get(header::AUTHORIZATION)?;
    let auth_str = auth_header.to_str().ok()?;
    auth_str
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Optional authentication middleware
///
/// Attaches `AuthenticatedUser` when a valid token is presented. Anonymous
/// requests pass through; the permission checks in each handler decide.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_bearer_token(&request) {
        match state.user_service.authenticate(&token).await {
            Ok(Some(user)) => {
                request.extensions_mut().insert(AuthenticatedUser(user));
            }
            Ok(None) => tracing::debug!("Rejected unknown or expired token"),
            Err(e) => tracing::warn!("Token validation failed: {}", e),
        }
    }
    next.run(request).await
}

/// The acting user, if the request was authenticated
#[derive(Debug, Clone)]
pub struct Actor(pub Option<User>);

impl Actor {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }

    /// Enforce a decision that requires a signed-in user and return that user
    pub fn require(self, decision: Decision) -> Result<User, ApiError> {
        enforce(decision)?;
        self.0.ok_or_else(credentials_missing)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Actor {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Actor(
            parts
                .extensions
                .get::<AuthenticatedUser>()
                .map(|au| au.0.clone()),
        ))
    }
}

/// JSON body extractor whose rejections use the API error envelope
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::validation_error(rejection.body_text())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with_auth(value: &str) -> Request {
        Request::builder()
            .header(header::AUTHORIZATION, value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(
            extract_bearer_token(&request_with_auth("Bearer abc123")).as_deref(),
            Some("abc123")
        );
        assert!(extract_bearer_token(&request_with_auth("Basic abc123")).is_none());
        assert!(extract_bearer_token(&request_with_auth("Bearer ")).is_none());

        let anonymous = Request::builder().body(Body::empty()).unwrap();
        assert!(extract_bearer_token(&anonymous).is_none());
    }

    #[test]
    fn test_error_status_codes() {
        let cases = [
            (ApiError::unauthorized("x"), StatusCode::UNAUTHORIZED),
            (ApiError::forbidden("x"), StatusCode::FORBIDDEN),
            (ApiError::not_found("x"), StatusCode::NOT_FOUND),
            (ApiError::validation_error("x"), StatusCode::BAD_REQUEST),
            (ApiError::new("SOMETHING_ELSE", "x"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_field_error_details() {
        let error = ApiError::field_error("score: must be between 1 and 10");
        assert_eq!(error.error.code, "VALIDATION_ERROR");
        assert_eq!(
            error.error.details,
            Some(serde_json::json!({"score": ["must be between 1 and 10"]}))
        );

        let plain = ApiError::field_error("You have already reviewed this title");
        assert!(plain.error.details.is_none());
    }

    #[test]
    fn test_enforce() {
        assert!(enforce(Decision::Allow).is_ok());
        assert_eq!(enforce(Decision::Unauthenticated).unwrap_err().error.code, "UNAUTHORIZED");
        assert_eq!(enforce(Decision::Forbidden).unwrap_err().error.code, "FORBIDDEN");
    }
}
