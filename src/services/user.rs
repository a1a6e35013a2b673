//! User service
//!
//! Account lifecycle and authentication:
//! - Signup: issue a one-time confirmation code by email
//! - Confirmation: exchange (username, code) for an access token
//! - Bearer token validation and expired token cleanup
//! - Admin user management and self-service profile edits

use crate::config::AdminBootstrap;
use crate::db::is_unique_violation;
use crate::db::repositories::{TokenRepository, UserRepository};
use crate::models::{
    AccessToken, CreateUserInput, ListParams, PagedResult, UpdateUserInput, User, UserRole,
};
use crate::services::email::Mailer;
use crate::services::rating::RatingAggregator;
use anyhow::Context;
use chrono::{Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use uuid::Uuid;

/// Default access token lifetime in days
const DEFAULT_TOKEN_TTL_DAYS: i64 = 1;

pub const USERNAME_MAX_LEN: usize = 150;
pub const EMAIL_MAX_LEN: usize = 254;
pub const NAME_MAX_LEN: usize = 150;

/// Path segment of the self-service endpoints, never a valid username
pub const RESERVED_USERNAME: &str = "me";

static USERNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("valid regex"));

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Username or email already taken
    #[error("User already exists: {0}")]
    UserExists(String),

    #[error("User not found: {0}")]
    NotFound(String),

    /// Confirmation code missing, stale or wrong
    #[error("Invalid confirmation code")]
    InvalidCode,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Input for the signup step
#[derive(Debug, Clone)]
pub struct SignupInput {
    pub username: String,
    pub email: String,
}

/// Check a username against the allowed alphabet, length and reserved names
pub fn validate_username(username: &str) -> Result<(), UserServiceError> {
    if username.is_empty() {
        return Err(UserServiceError::ValidationError("username: cannot be empty".to_string()));
    }
    if username.chars().count() > USERNAME_MAX_LEN {
        return Err(UserServiceError::ValidationError(format!(
            "username: at most {} characters",
            USERNAME_MAX_LEN
        )));
    }
    if !USERNAME_RE.is_match(username) {
        return Err(UserServiceError::ValidationError(
            "username: only letters, digits and @/./+/-/_ are allowed".to_string(),
        ));
    }
    if username.eq_ignore_ascii_case(RESERVED_USERNAME) {
        return Err(UserServiceError::ValidationError(format!(
            "username: '{}' is reserved",
            RESERVED_USERNAME
        )));
    }
    Ok(())
}

/// Basic email shape check
pub fn validate_email(email: &str) -> Result<(), UserServiceError> {
    if email.is_empty() {
        return Err(UserServiceError::ValidationError("email: cannot be empty".to_string()));
    }
    if email.chars().count() > EMAIL_MAX_LEN {
        return Err(UserServiceError::ValidationError(format!(
            "email: at most {} characters",
            EMAIL_MAX_LEN
        )));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') && !domain.contains('@') => Ok(()),
        _ => Err(UserServiceError::ValidationError("email: invalid address".to_string())),
    }
}

fn validate_name(field: &str, value: &str) -> Result<(), UserServiceError> {
    if value.chars().count() > NAME_MAX_LEN {
        return Err(UserServiceError::ValidationError(format!(
            "{}: at most {} characters",
            field, NAME_MAX_LEN
        )));
    }
    Ok(())
}

fn generate_confirmation_code() -> String {
    Uuid::new_v4().to_string()
}

/// User service for signup, authentication and account management
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    token_repo: Arc<dyn TokenRepository>,
    mailer: Arc<dyn Mailer>,
    token_ttl: Duration,
    rating: Option<Arc<RatingAggregator>>,
}

impl UserService {
    /// Create a new user service with the default token lifetime
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        token_repo: Arc<dyn TokenRepository>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self::with_token_ttl(user_repo, token_repo, mailer, DEFAULT_TOKEN_TTL_DAYS)
    }

    /// Create a new user service with a custom token lifetime
    pub fn with_token_ttl(
        user_repo: Arc<dyn UserRepository>,
        token_repo: Arc<dyn TokenRepository>,
        mailer: Arc<dyn Mailer>,
        token_ttl_days: i64,
    ) -> Self {
        Self {
            user_repo,
            token_repo,
            mailer,
            token_ttl: Duration::days(token_ttl_days),
            rating: None,
        }
    }

    /// Refresh title ratings when a deleted account takes its reviews along
    pub fn with_rating(mut self, rating: Arc<RatingAggregator>) -> Self {
        self.rating = Some(rating);
        self
    }

    /// Issue a confirmation code for `(username, email)`.
    ///
    /// - Neither is registered: a new inactive account is created.
    /// - Both belong to the same account: a fresh code replaces the old one.
    /// - Otherwise the pair conflicts with an existing account.
    ///
    /// The code is delivered by email and never returned.
    pub async fn request_code(&self, input: SignupInput) -> Result<User, UserServiceError> {
        validate_username(&input.username)?;
        validate_email(&input.email)?;

        let by_username = self
            .user_repo
            .get_by_username(&input.username)
            .await
            .context("Failed to look up username")?;
        let by_email = self
            .user_repo
            .get_by_email(&input.email)
            .await
            .context("Failed to look up email")?;

        let code = generate_confirmation_code();

        let user = match (by_username, by_email) {
            (None, None) => {
                let mut user = User::new(input.username.clone(), input.email.clone(), UserRole::User);
                user.confirmation_code = Some(code.clone());
                match self.user_repo.create(&user).await {
                    Ok(created) => {
                        tracing::info!(username = %created.username, "User signed up");
                        created
                    }
                    Err(e) if is_unique_violation(&e) => {
                        return Err(UserServiceError::UserExists(input.username));
                    }
                    Err(e) => return Err(e.context("Failed to create user").into()),
                }
            }
            (Some(user), Some(other)) if user.id == other.id => {
                self.user_repo
                    .set_confirmation_code(user.id, &code)
                    .await
                    .context("Failed to store confirmation code")?;
                tracing::debug!(username = %user.username, "Confirmation code reissued");
                user
            }
            (Some(_), _) => {
                return Err(UserServiceError::ValidationError(
                    "username: already registered with a different email".to_string(),
                ));
            }
            (None, Some(_)) => {
                return Err(UserServiceError::ValidationError(
                    "email: already registered with a different username".to_string(),
                ));
            }
        };

        self.mailer
            .send_confirmation_code(&user.email, &user.username, &code)
            .await
            .context("Failed to deliver confirmation code")?;

        Ok(user)
    }

    /// Exchange a confirmation code for an access token.
    ///
    /// `identity` is matched against usernames first, then emails. The code
    /// must equal the most recently issued one and is consumed on success.
    pub async fn confirm(&self, identity: &str, code: &str) -> Result<AccessToken, UserServiceError> {
        let user = match self
            .user_repo
            .get_by_username(identity)
            .await
            .context("Failed to look up username")?
        {
            Some(user) => user,
            None => self
                .user_repo
                .get_by_email(identity)
                .await
                .context("Failed to look up email")?
                .ok_or_else(|| UserServiceError::NotFound(identity.to_string()))?,
        };

        if code.is_empty() || user.confirmation_code.as_deref() != Some(code) {
            return Err(UserServiceError::InvalidCode);
        }

        // A concurrent confirmation may have consumed the code since the read.
        let consumed = self
            .user_repo
            .consume_confirmation_code(user.id, code)
            .await
            .context("Failed to consume confirmation code")?;
        if !consumed {
            return Err(UserServiceError::InvalidCode);
        }

        let token = self.issue_token(user.id).await?;
        tracing::info!(username = %user.username, "Confirmation code exchanged for token");
        Ok(token)
    }

    async fn issue_token(&self, user_id: i64) -> Result<AccessToken, UserServiceError> {
        let now = Utc::now();
        let token = AccessToken {
            token: Uuid::new_v4().simple().to_string(),
            user_id,
            expires_at: now + self.token_ttl,
            created_at: now,
        };

        let stored = self
            .token_repo
            .create(&token)
            .await
            .context("Failed to store access token")?;
        Ok(stored)
    }

    /// Resolve a bearer token to its user. Unknown or expired tokens yield `None`.
    pub async fn authenticate(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let token = match self
            .token_repo
            .get(token)
            .await
            .context("Failed to get access token")?
        {
            Some(t) => t,
            None => return Ok(None),
        };

        if token.is_expired() {
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(token.user_id)
            .await
            .context("Failed to get user")?;
        Ok(user)
    }

    /// Remove expired tokens, returning how many were deleted
    pub async fn purge_expired_tokens(&self) -> Result<u64, UserServiceError> {
        let purged = self
            .token_repo
            .delete_expired()
            .await
            .context("Failed to purge expired tokens")?;
        Ok(purged)
    }

    /// Create the configured superuser or promote the existing account
    pub async fn ensure_superuser(&self, admin: &AdminBootstrap) -> Result<User, UserServiceError> {
        validate_username(&admin.username)?;
        validate_email(&admin.email)?;

        let existing = self
            .user_repo
            .get_by_username(&admin.username)
            .await
            .context("Failed to look up admin user")?;

        let user = match existing {
            Some(mut user) => {
                if user.is_superuser && user.role == UserRole::Admin {
                    return Ok(user);
                }
                user.is_superuser = true;
                user.role = UserRole::Admin;
                self.user_repo.update(&user).await.context("Failed to promote admin")?
            }
            None => {
                let mut user = User::new(admin.username.clone(), admin.email.clone(), UserRole::Admin);
                user.is_superuser = true;
                self.user_repo.create(&user).await.context("Failed to create admin")?
            }
        };

        tracing::info!(username = %user.username, "Superuser ensured");
        Ok(user)
    }

    /// Admin-created account. It stays inactive until the user confirms a code.
    pub async fn create_user(&self, input: CreateUserInput) -> Result<User, UserServiceError> {
        validate_username(&input.username)?;
        validate_email(&input.email)?;

        let mut user = User::new(input.username, input.email, input.role.unwrap_or_default());
        if let Some(first_name) = input.first_name {
            validate_name("first_name", &first_name)?;
            user.first_name = first_name;
        }
        if let Some(last_name) = input.last_name {
            validate_name("last_name", &last_name)?;
            user.last_name = last_name;
        }
        if let Some(bio) = input.bio {
            user.bio = bio;
        }

        match self.user_repo.create(&user).await {
            Ok(created) => Ok(created),
            Err(e) if is_unique_violation(&e) => Err(UserServiceError::UserExists(user.username)),
            Err(e) => Err(e.context("Failed to create user").into()),
        }
    }

    /// Get a user by username
    pub async fn get_by_username(&self, username: &str) -> Result<User, UserServiceError> {
        self.user_repo
            .get_by_username(username)
            .await
            .context("Failed to get user")?
            .ok_or_else(|| UserServiceError::NotFound(username.to_string()))
    }

    /// List users, optionally filtered by a username substring
    pub async fn list(
        &self,
        search: Option<&str>,
        params: &ListParams,
    ) -> Result<PagedResult<User>, UserServiceError> {
        let (users, total) = self
            .user_repo
            .list(search, params)
            .await
            .context("Failed to list users")?;
        Ok(PagedResult::new(users, total, params))
    }

    /// Admin edit of any account, role included
    pub async fn update_user(&self, username: &str, input: UpdateUserInput) -> Result<User, UserServiceError> {
        let user = self.get_by_username(username).await?;
        self.apply_update(user, input).await
    }

    /// Self-service profile edit. The role cannot be changed this way.
    pub async fn update_profile(&self, user: User, input: UpdateUserInput) -> Result<User, UserServiceError> {
        let input = UpdateUserInput { role: None, ..input };
        self.apply_update(user, input).await
    }

    async fn apply_update(&self, mut user: User, input: UpdateUserInput) -> Result<User, UserServiceError> {
        if let Some(username) = input.username {
            validate_username(&username)?;
            user.username = username;
        }
        if let Some(email) = input.email {
            validate_email(&email)?;
            user.email = email;
        }
        if let Some(first_name) = input.first_name {
            validate_name("first_name", &first_name)?;
            user.first_name = first_name;
        }
        if let Some(last_name) = input.last_name {
            validate_name("last_name", &last_name)?;
            user.last_name = last_name;
        }
        if let Some(bio) = input.bio {
            user.bio = bio;
        }
        if let Some(role) = input.role {
            user.role = role;
        }

        match self.user_repo.update(&user).await {
            Ok(updated) => Ok(updated),
            Err(e) if is_unique_violation(&e) => Err(UserServiceError::UserExists(user.username)),
            Err(e) => Err(e.context("Failed to update user").into()),
        }
    }

    /// Delete an account with its tokens, reviews and comments
    pub async fn delete_user(&self, username: &str) -> Result<(), UserServiceError> {
        let user = self.get_by_username(username).await?;
        let reviewed = match &self.rating {
            Some(rating) => rating.titles_reviewed_by(user.id).await?,
            None => Vec::new(),
        };

        self.user_repo.delete(user.id).await.context("Failed to delete user")?;

        if let Some(rating) = &self.rating {
            for title_id in reviewed {
                rating.recompute(title_id).await?;
            }
        }
        tracing::info!(username = %username, "User deleted");
        Ok(())
    }
}
