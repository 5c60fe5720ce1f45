//! User accounts and bearer-token sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use laceup_core::{Email, UserId};

/// A postal address, used both for the user's saved address and for the
/// shipping address recorded on payment confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

/// A user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    /// Argon2 PHC string; never serialized into API responses.
    pub password_hash: String,
    pub is_admin: bool,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a non-admin user. The display name defaults to the email's
    /// local part.
    #[must_use]
    pub fn new(email: Email, password_hash: String) -> Self {
        let now = Utc::now();
        let display_name = email.local_part().to_owned();
        Self {
            id: UserId::generate(),
            email,
            password_hash,
            is_admin: false,
            display_name,
            address: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A persisted bearer-token session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    /// Whether the session has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// The authenticated caller, resolved by the auth middleware and trusted
/// as given by everything downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Email,
    pub is_admin: bool,
    pub display_name: String,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            is_admin: user.is_admin,
            display_name: user.display_name.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn new_user_defaults() {
        let email = Email::parse("jane@example.com").unwrap();
        let user = User::new(email, "$argon2id$stub".to_owned());
        assert!(!user.is_admin);
        assert_eq!(user.display_name, "jane");
    }

    #[test]
    fn session_expiry() {
        let mut session = AuthSession {
            token: "tok".to_owned(),
            user_id: UserId::generate(),
            created_at: Utc::now(),
            expires_at: Utc::now() + Duration::days(7),
        };
        assert!(!session.is_expired());
        session.expires_at = Utc::now() - Duration::seconds(1);
        assert!(session.is_expired());
    }
}
