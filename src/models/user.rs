//! User model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Registered account.
///
/// Accounts are created inactive by the signup flow and activated by the
/// first successful code confirmation. There is no password; possession of
/// the emailed code is the credential.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Username (unique)
    pub username: String,
    /// Email address (unique)
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    /// Role within the service
    pub role: UserRole,
    /// Staff flag, grants admin rights regardless of role
    pub is_superuser: bool,
    /// Set once a confirmation code has been exchanged
    pub is_active: bool,
    /// Most recently issued, not yet consumed confirmation code
    #[serde(skip_serializing, default)]
    pub confirmation_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new inactive user with an empty profile.
    ///
    /// The ID will be set to 0 and should be assigned by the database.
    pub fn new(username: String, email: String, role: UserRole) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            username,
            email,
            first_name: String::new(),
            last_name: String::new(),
            bio: String::new(),
            role,
            is_superuser: false,
            is_active: false,
            confirmation_code: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Admin role or superuser
    pub fn is_admin(&self) -> bool {
        self.is_superuser || self.role == UserRole::Admin
    }

    pub fn is_moderator(&self) -> bool {
        self.role == UserRole::Moderator
    }

    /// May edit or delete content authored by someone else
    pub fn is_staff_member(&self) -> bool {
        self.is_admin() || self.is_moderator()
    }
}

/// User role for authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular account: may review and comment
    #[default]
    User,
    /// May edit and delete any review or comment
    Moderator,
    /// Full access, including catalogue and user management
    Admin,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::User => write!(f, "user"),
            UserRole::Moderator => write!(f, "moderator"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(UserRole::User),
            "moderator" => Ok(UserRole::Moderator),
            "admin" => Ok(UserRole::Admin),
            _ => Err(anyhow::anyhow!("Invalid user role: {}", s)),
        }
    }
}

/// Input for creating a user through the admin API
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateUserInput {
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: Option<UserRole>,
}

/// Partial profile update. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: Option<UserRole>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_defaults() {
        let user = User::new("reader".to_string(), "reader@example.com".to_string(), UserRole::default());

        assert_eq!(user.id, 0);
        assert_eq!(user.role, UserRole::User);
        assert!(!user.is_active);
        assert!(!user.is_superuser);
        assert!(user.confirmation_code.is_none());
        assert!(user.bio.is_empty());
    }

    #[test]
    fn test_role_predicates() {
        let mut user = User::new("u".to_string(), "u@example.com".to_string(), UserRole::User);
        assert!(!user.is_admin());
        assert!(!user.is_staff_member());

        user.role = UserRole::Moderator;
        assert!(user.is_moderator());
        assert!(!user.is_admin());
        assert!(user.is_staff_member());

        user.role = UserRole::Admin;
        assert!(user.is_admin());
        assert!(!user.is_moderator());
    }

    #[test]
    fn test_superuser_counts_as_admin() {
        let mut user = User::new("root".to_string(), "root@example.com".to_string(), UserRole::User);
        user.is_superuser = true;
        assert!(user.is_admin());
        assert!(user.is_staff_member());
    }

    #[test]
    fn test_role_round_trip_through_strings() {
        for role in [UserRole::User, UserRole::Moderator, UserRole::Admin] {
            assert_eq!(role.to_string().parse::<UserRole>().unwrap(), role);
        }
        assert_eq!("ADMIN".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert!("editor".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_confirmation_code_not_serialized() {
        let mut user = User::new("u".to_string(), "u@example.com".to_string(), UserRole::User);
        user.confirmation_code = Some("secret".to_string());

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("confirmation_code").is_none());
        assert_eq!(json["role"], "user");
    }
}
