//! Access token model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bearer token minted by a successful code confirmation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    /// Opaque token value
    pub token: String,
    /// Owning user
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl AccessToken {
    /// Check if the token has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_is_expired() {
        let now = Utc::now();
        let live = AccessToken {
            token: "a".to_string(),
            user_id: 1,
            expires_at: now + Duration::hours(1),
            created_at: now,
        };
        let dead = AccessToken {
            expires_at: now - Duration::seconds(1),
            ..live.clone()
        };

        assert!(!live.is_expired());
        assert!(dead.is_expired());
    }
}
