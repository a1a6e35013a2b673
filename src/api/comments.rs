//! Comment API endpoints, nested under a review
//!
//! - GET/POST /api/v1/titles/{title_id}/reviews/{review_id}/comments
//! - GET/PATCH/DELETE /api/v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}

use axum::{
    extract::{Path, Query, State},
    http::{Method, StatusCode},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::PaginationQuery;
use crate::api::middleware::{enforce, Actor, ApiError, ApiJson, AppState};
use crate::models::{Comment, PagedResult};
use crate::permissions::author_or_staff_or_read_only;
use crate::services::CommentServiceError;

/// Request body for creating a comment
#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub text: String,
}

/// Request body for updating a comment
#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub text: Option<String>,
}

impl From<CommentServiceError> for ApiError {
    fn from(err: CommentServiceError) -> Self {
        match err {
            CommentServiceError::ValidationError(msg) => ApiError::field_error(msg),
            CommentServiceError::NotFound(what) => ApiError::not_found(format!("Not found: {}", what)),
            CommentServiceError::InternalError(e) => ApiError::internal_error(format!("{:#}", e)),
        }
    }
}

/// Build the comments router
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments",
            get(list_comments).post(create_comment),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments/{comment_id}",
            get(get_comment).patch(update_comment).delete(delete_comment),
        )
}

async fn list_comments(
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i64, i64)>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<PagedResult<Comment>>, ApiError> {
    let page = state
        .comment_service
        .list(title_id, review_id, &query.params())
        .await?;
    Ok(Json(page))
}

async fn get_comment(
    State(state): State<AppState>,
    Path((title_id, review_id, comment_id)): Path<(i64, i64, i64)>,
) -> Result<Json<Comment>, ApiError> {
    let comment = state
        .comment_service
        .get(title_id, review_id, comment_id)
        .await?;
    Ok(Json(comment))
}

async fn create_comment(
    State(state): State<AppState>,
    method: Method,
    actor: Actor,
    Path((title_id, review_id)): Path<(i64, i64)>,
    ApiJson(body): ApiJson<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let decision = author_or_staff_or_read_only(actor.user(), &method, None);
    let author = actor.require(decision)?;

    let comment = state
        .comment_service
        .create(title_id, review_id, &author, body.text)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn update_comment(
    State(state): State<AppState>,
    method: Method,
    actor: Actor,
    Path((title_id, review_id, comment_id)): Path<(i64, i64, i64)>,
    ApiJson(body): ApiJson<UpdateCommentRequest>,
) -> Result<Json<Comment>, ApiError> {
    enforce(author_or_staff_or_read_only(actor.user(), &method, None))?;
    let comment = state
        .comment_service
        .get(title_id, review_id, comment_id)
        .await?;
    enforce(author_or_staff_or_read_only(actor.user(), &method, Some(comment.author_id)))?;

    let updated = state.comment_service.update(comment, body.text).await?;
    Ok(Json(updated))
}

async fn delete_comment(
    State(state): State<AppState>,
    method: Method,
    actor: Actor,
    Path((title_id, review_id, comment_id)): Path<(i64, i64, i64)>,
) -> Result<StatusCode, ApiError> {
    enforce(author_or_staff_or_read_only(actor.user(), &method, None))?;
    let comment = state
        .comment_service
        .get(title_id, review_id, comment_id)
        .await?;
    enforce(author_or_staff_or_read_only(actor.user(), &method, Some(comment.author_id)))?;

    state.comment_service.delete(&comment).await?;
    Ok(StatusCode::NO_CONTENT)
}
