//! Authentication API endpoints
//!
//! Handles HTTP requests for the confirmation-code flow:
//! - POST /api/v1/auth/signup - Email a confirmation code
//! - POST /api/v1/auth/token - Exchange username + code for an access token

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, ApiJson, AppState};
use crate::services::{SignupInput, UserServiceError};

/// Request body for signup
#[derive(Debug, Deserialize, Serialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
}

/// Request body for token exchange
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub confirmation_code: String,
}

/// Response for a successful token exchange
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::ValidationError(msg) => ApiError::field_error(msg),
            UserServiceError::UserExists(name) => {
                ApiError::validation_error(format!("User already exists: {}", name))
            }
            UserServiceError::NotFound(name) => ApiError::not_found(format!("User not found: {}", name)),
            UserServiceError::InvalidCode => {
                ApiError::field_error("confirmation_code: invalid or already used")
            }
            UserServiceError::InternalError(e) => ApiError::internal_error(format!("{:#}", e)),
        }
    }
}

/// Build the auth router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/token", post(obtain_token))
}

/// POST /api/v1/auth/signup - Request a confirmation code
///
/// Creates the account on first use. Repeating the request with the same
/// pair sends a fresh code.
async fn signup(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SignupRequest>,
) -> Result<Json<SignupRequest>, ApiError> {
    let user = state
        .user_service
        .request_code(SignupInput {
            username: body.username,
            email: body.email,
        })
        .await?;

    Ok(Json(SignupRequest {
        username: user.username,
        email: user.email,
    }))
}

/// POST /api/v1/auth/token - Exchange a confirmation code for a token
async fn obtain_token(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = state
        .user_service
        .confirm(&body.username, &body.confirmation_code)
        .await?;

    Ok(Json(TokenResponse { token: token.token }))
}
