//! User management API endpoints
//!
//! Admin routes:
//! - GET /api/v1/users - List users (optional `search` on username)
//! - POST /api/v1/users - Create a user with any role
//! - GET/PATCH/DELETE /api/v1/users/{username}
//!
//! Self-service routes:
//! - GET/PATCH /api/v1/users/me

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::api::common::SearchQuery;
use crate::api::middleware::{enforce, Actor, ApiError, ApiJson, AppState};
use crate::models::{CreateUserInput, PagedResult, UpdateUserInput, User};
use crate::permissions::{admin_only, authenticated};

/// Build the users router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/me", get(get_me).patch(update_me))
        .route(
            "/{username}",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

/// GET /api/v1/users
async fn list_users(
    State(state): State<AppState>,
    actor: Actor,
    Query(query): Query<SearchQuery>,
) -> Result<Json<PagedResult<User>>, ApiError> {
    enforce(admin_only(actor.user()))?;

    let page = state
        .user_service
        .list(query.term(), &query.params())
        .await?;
    Ok(Json(page))
}

/// POST /api/v1/users
async fn create_user(
    State(state): State<AppState>,
    actor: Actor,
    ApiJson(input): ApiJson<CreateUserInput>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    enforce(admin_only(actor.user()))?;

    let user = state.user_service.create_user(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /api/v1/users/{username}
async fn get_user(
    State(state): State<AppState>,
    actor: Actor,
    Path(username): Path<String>,
) -> Result<Json<User>, ApiError> {
    enforce(admin_only(actor.user()))?;

    let user = state.user_service.get_by_username(&username).await?;
    Ok(Json(user))
}

/// PATCH /api/v1/users/{username}
async fn update_user(
    State(state): State<AppState>,
    actor: Actor,
    Path(username): Path<String>,
    ApiJson(input): ApiJson<UpdateUserInput>,
) -> Result<Json<User>, ApiError> {
    enforce(admin_only(actor.user()))?;

    let user = state.user_service.update_user(&username, input).await?;
    Ok(Json(user))
}

/// DELETE /api/v1/users/{username}
async fn delete_user(
    State(state): State<AppState>,
    actor: Actor,
    Path(username): Path<String>,
) -> Result<StatusCode, ApiError> {
    enforce(admin_only(actor.user()))?;

    state.user_service.delete_user(&username).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/users/me
async fn get_me(actor: Actor) -> Result<Json<User>, ApiError> {
    let decision = authenticated(actor.user());
    Ok(Json(actor.require(decision)?))
}

/// PATCH /api/v1/users/me
///
/// The role field is ignored here.
async fn update_me(
    State(state): State<AppState>,
    actor: Actor,
    ApiJson(input): ApiJson<UpdateUserInput>,
) -> Result<Json<User>, ApiError> {
    let decision = authenticated(actor.user());
    let user = actor.require(decision)?;

    let updated = state.user_service.update_profile(user, input).await?;
    Ok(Json(updated))
}
