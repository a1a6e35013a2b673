//! Title API endpoints
//!
//! - GET /api/v1/titles - List with `category`, `genre`, `year`, `name` filters
//! - POST /api/v1/titles - Create (admin)
//! - GET /api/v1/titles/{title_id} - Retrieve
//! - PATCH /api/v1/titles/{title_id} - Partial update (admin)
//! - DELETE /api/v1/titles/{title_id} - Delete (admin)

use axum::{
    extract::{Path, Query, State},
    http::{Method, StatusCode},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{enforce, Actor, ApiError, ApiJson, AppState};
use crate::models::{CreateTitleInput, ListParams, PagedResult, Title, TitleFilter, UpdateTitleInput};
use crate::permissions::admin_or_read_only;
use crate::services::TitleServiceError;

/// Query parameters for listing titles
#[derive(Debug, Default, Deserialize)]
pub struct TitleListQuery {
    /// Category slug
    pub category: Option<String>,
    /// Genre slug
    pub genre: Option<String>,
    pub year: Option<i32>,
    pub name: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl TitleListQuery {
    fn filter(&self) -> TitleFilter {
        let non_blank = |s: &Option<String>| s.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string);
        TitleFilter {
            category: non_blank(&self.category),
            genre: non_blank(&self.genre),
            year: self.year,
            name: non_blank(&self.name),
        }
    }
}

impl From<TitleServiceError> for ApiError {
    fn from(err: TitleServiceError) -> Self {
        match err {
            TitleServiceError::ValidationError(msg) => ApiError::field_error(msg),
            TitleServiceError::NotFound(id) => ApiError::not_found(format!("Title not found: {}", id)),
            TitleServiceError::InternalError(e) => ApiError::internal_error(format!("{:#}", e)),
        }
    }
}

/// Build the titles router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_titles).post(create_title))
        .route(
            "/{title_id}",
            get(get_title).patch(update_title).delete(delete_title),
        )
}

/// GET /api/v1/titles
async fn list_titles(
    State(state): State<AppState>,
    Query(query): Query<TitleListQuery>,
) -> Result<Json<PagedResult<Title>>, ApiError> {
    let params = ListParams::new(query.limit, query.offset);
    let page = state.title_service.list(&query.filter(), &params).await?;
    Ok(Json(page))
}

/// GET /api/v1/titles/{title_id}
async fn get_title(
    State(state): State<AppState>,
    Path(title_id): Path<i64>,
) -> Result<Json<Title>, ApiError> {
    let title = state.title_service.get(title_id).await?;
    Ok(Json(title))
}

/// POST /api/v1/titles
async fn create_title(
    State(state): State<AppState>,
    method: Method,
    actor: Actor,
    ApiJson(input): ApiJson<CreateTitleInput>,
) -> Result<(StatusCode, Json<Title>), ApiError> {
    enforce(admin_or_read_only(actor.user(), &method))?;

    let title = state.title_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(title)))
}

/// PATCH /api/v1/titles/{title_id}
async fn update_title(
    State(state): State<AppState>,
    method: Method,
    actor: Actor,
    Path(title_id): Path<i64>,
    ApiJson(input): ApiJson<UpdateTitleInput>,
) -> Result<Json<Title>, ApiError> {
    enforce(admin_or_read_only(actor.user(), &method))?;

    let title = state.title_service.update(title_id, input).await?;
    Ok(Json(title))
}

/// DELETE /api/v1/titles/{title_id}
async fn delete_title(
    State(state): State<AppState>,
    method: Method,
    actor: Actor,
    Path(title_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    enforce(admin_or_read_only(actor.user(), &method))?;

    state.title_service.delete(title_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_filters_are_dropped() {
        let query = TitleListQuery {
            category: Some("film".to_string()),
            genre: Some(" ".to_string()),
            year: Some(1999),
            ..Default::default()
        };
        let filter = query.filter();

        assert_eq!(filter.category.as_deref(), Some("film"));
        assert!(filter.genre.is_none());
        assert_eq!(filter.year, Some(1999));
        assert!(filter.name.is_none());
    }
}
