//! Review API endpoints
//!
//! - GET /api/v1/titles/{title_id}/reviews - List
//! - POST /api/v1/titles/{title_id}/reviews - Create (signed in)
//! - GET /api/v1/titles/{title_id}/reviews/{review_id} - Retrieve
//! - PATCH /api/v1/titles/{title_id}/reviews/{review_id} - Update (author or staff)
//! - DELETE /api/v1/titles/{title_id}/reviews/{review_id} - Delete (author or staff)

use axum::{
    extract::{Path, Query, State},
    http::{Method, StatusCode},
    routing::get,
    Json, Router,
};

use crate::api::common::PaginationQuery;
use crate::api::middleware::{enforce, Actor, ApiError, ApiJson, AppState};
use crate::models::{CreateReviewInput, PagedResult, Review, UpdateReviewInput};
use crate::permissions::author_or_staff_or_read_only;
use crate::services::ReviewServiceError;

impl From<ReviewServiceError> for ApiError {
    fn from(err: ReviewServiceError) -> Self {
        match err {
            ReviewServiceError::ValidationError(msg) => ApiError::field_error(msg),
            ReviewServiceError::DuplicateReview => {
                ApiError::validation_error("You have already reviewed this title")
            }
            ReviewServiceError::NotFound(what) => ApiError::not_found(format!("Not found: {}", what)),
            ReviewServiceError::InternalError(e) => ApiError::internal_error(format!("{:#}", e)),
        }
    }
}

/// Build the reviews router
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/titles/{title_id}/reviews",
            get(list_reviews).post(create_review),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}",
            get(get_review).patch(update_review).delete(delete_review),
        )
}

/// GET /api/v1/titles/{title_id}/reviews
async fn list_reviews(
    State(state): State<AppState>,
    Path(title_id): Path<i64>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<PagedResult<Review>>, ApiError> {
    let page = state.review_service.list(title_id, &query.params()).await?;
    Ok(Json(page))
}

/// GET /api/v1/titles/{title_id}/reviews/{review_id}
async fn get_review(
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i64, i64)>,
) -> Result<Json<Review>, ApiError> {
    let review = state.review_service.get(title_id, review_id).await?;
    Ok(Json(review))
}

/// POST /api/v1/titles/{title_id}/reviews
async fn create_review(
    State(state): State<AppState>,
    method: Method,
    actor: Actor,
    Path(title_id): Path<i64>,
    ApiJson(input): ApiJson<CreateReviewInput>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    let decision = author_or_staff_or_read_only(actor.user(), &method, None);
    let author = actor.require(decision)?;

    let review = state.review_service.create(title_id, &author, input).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// PATCH /api/v1/titles/{title_id}/reviews/{review_id}
async fn update_review(
    State(state): State<AppState>,
    method: Method,
    actor: Actor,
    Path((title_id, review_id)): Path<(i64, i64)>,
    ApiJson(input): ApiJson<UpdateReviewInput>,
) -> Result<Json<Review>, ApiError> {
    enforce(author_or_staff_or_read_only(actor.user(), &method, None))?;
    let review = state.review_service.get(title_id, review_id).await?;
    enforce(author_or_staff_or_read_only(actor.user(), &method, Some(review.author_id)))?;

    let updated = state.review_service.update(review, input).await?;
    Ok(Json(updated))
}

/// DELETE /api/v1/titles/{title_id}/reviews/{review_id}
async fn delete_review(
    State(state): State<AppState>,
    method: Method,
    actor: Actor,
    Path((title_id, review_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    enforce(author_or_staff_or_read_only(actor.user(), &method, None))?;
    let review = state.review_service.get(title_id, review_id).await?;
    enforce(author_or_staff_or_read_only(actor.user(), &method, Some(review.author_id)))?;

    state.review_service.delete(&review).await?;
    Ok(StatusCode::NO_CONTENT)
}
