//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP API endpoints of the review service:
//! - Auth endpoints (signup, token exchange)
//! - User management and self-service profile
//! - Category and genre endpoints
//! - Title endpoints
//! - Review and comment endpoints nested under titles

pub mod auth;
pub mod comments;
pub mod common;
pub mod middleware;
pub mod reviews;
pub mod taxonomy;
pub mod titles;
pub mod users;

#[cfg(test)]
mod tests;

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::models::TaxonomyKind;

pub use middleware::{AppState, ApiError, AuthenticatedUser};

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/categories", taxonomy::router(TaxonomyKind::Category))
        .nest("/genres", taxonomy::router(TaxonomyKind::Genre))
        .nest("/titles", titles::router())
        .merge(reviews::router())
        .merge(comments::router())
        .layer(axum_middleware::from_fn_with_state(
            state,
            middleware::optional_auth,
        ))
}

async fn not_found() -> ApiError {
    ApiError::not_found("No such endpoint")
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> anyhow::Result<Router> {
    let origin = cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin: {}", cors_origin))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Ok(Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state))
}
