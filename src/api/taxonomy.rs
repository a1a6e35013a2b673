//! Category and genre API endpoints
//!
//! Both collections share these handlers; the router is mounted once per
//! `TaxonomyKind`:
//! - GET /api/v1/{categories,genres} - List (optional `search` on name)
//! - POST /api/v1/{categories,genres} - Create (admin)
//! - DELETE /api/v1/{categories,genres}/{slug} - Delete (admin)

use axum::{
    extract::{Path, Query, State},
    http::{Method, StatusCode},
    routing::{delete, get},
    Extension, Json, Router,
};
use serde::Deserialize;

use crate::api::common::SearchQuery;
use crate::api::middleware::{enforce, Actor, ApiError, ApiJson, AppState};
use crate::models::{PagedResult, Taxon, TaxonomyKind};
use crate::permissions::admin_or_read_only;
use crate::services::TaxonomyServiceError;

/// Request body for creating a category or genre
#[derive(Debug, Deserialize)]
pub struct CreateTaxonRequest {
    pub name: String,
    pub slug: String,
}

impl From<TaxonomyServiceError> for ApiError {
    fn from(err: TaxonomyServiceError) -> Self {
        match err {
            TaxonomyServiceError::ValidationError(msg) => ApiError::field_error(msg),
            TaxonomyServiceError::DuplicateSlug(slug) => {
                ApiError::field_error(format!("slug: '{}' is already taken", slug))
            }
            TaxonomyServiceError::NotFound(kind, slug) => {
                ApiError::not_found(format!("No {} with slug '{}'", kind, slug))
            }
            TaxonomyServiceError::InternalError(e) => ApiError::internal_error(format!("{:#}", e)),
        }
    }
}

/// Build the router for one taxonomy
pub fn router(kind: TaxonomyKind) -> Router<AppState> {
    Router::new()
        .route("/", get(list_taxa).post(create_taxon))
        .route("/{slug}", delete(delete_taxon))
        .layer(Extension(kind))
}

/// GET /api/v1/categories, /api/v1/genres
async fn list_taxa(
    State(state): State<AppState>,
    Extension(kind): Extension<TaxonomyKind>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<PagedResult<Taxon>>, ApiError> {
    let page = state
        .taxonomy(kind)
        .list(query.term(), &query.params())
        .await?;
    Ok(Json(page))
}

/// POST /api/v1/categories, /api/v1/genres
async fn create_taxon(
    State(state): State<AppState>,
    Extension(kind): Extension<TaxonomyKind>,
    method: Method,
    actor: Actor,
    ApiJson(body): ApiJson<CreateTaxonRequest>,
) -> Result<(StatusCode, Json<Taxon>), ApiError> {
    enforce(admin_or_read_only(actor.user(), &method))?;

    let taxon = state.taxonomy(kind).create(&body.name, &body.slug).await?;
    Ok((StatusCode::CREATED, Json(taxon)))
}

/// DELETE /api/v1/categories/{slug}, /api/v1/genres/{slug}
async fn delete_taxon(
    State(state): State<AppState>,
    Extension(kind): Extension<TaxonomyKind>,
    method: Method,
    actor: Actor,
    Path(slug): Path<String>,
) -> Result<StatusCode, ApiError> {
    enforce(admin_or_read_only(actor.user(), &method))?;

    state.taxonomy(kind).delete(&slug).await?;
    Ok(StatusCode::NO_CONTENT)
}
