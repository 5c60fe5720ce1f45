//! Account registration, login and bearer-token sessions.
//!
//! Passwords are hashed with Argon2id. Sessions are opaque random tokens
//! persisted server-side with an expiry; the middleware resolves them back
//! to a [`CurrentUser`] on every request.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use rand::RngCore;
use thiserror::Error;
use tracing::info;

use laceup_core::{Email, EmailError, UserId};

use crate::models::{Address, AuthSession, CurrentUser, User};
use crate::store::{Store, StoreError};

const MIN_PASSWORD_LENGTH: usize = 8;
const SESSION_TTL_DAYS: i64 = 7;
const TOKEN_BYTES: usize = 32;

/// Authentication failures.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Email/password pair did not match an account.
    #[error("invalid credentials")]
    InvalidCredentials,
    /// The bearer token matched no session.
    #[error("invalid token")]
    InvalidToken,
    /// The session exists but has expired.
    #[error("session expired")]
    SessionExpired,
    /// Registration with an email already on file.
    #[error("user already exists")]
    UserAlreadyExists,
    /// An admin operation targeted an account that does not exist.
    #[error("user not found")]
    UserNotFound,
    /// Password fails the strength requirements.
    #[error("{0}")]
    WeakPassword(String),
    /// A profile field failed validation.
    #[error("{0}")]
    InvalidProfile(String),
    /// The email address could not be parsed.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),
    /// The store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    /// Password hashing failed.
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}

/// A successful registration or login.
#[derive(Debug)]
pub struct AuthOutcome {
    pub user: CurrentUser,
    pub token: String,
}

/// Request body for updating the caller's profile; absent fields stay
/// unchanged.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfile {
    pub display_name: Option<String>,
    pub address: Option<Address>,
}

/// Authentication logic over a [`Store`].
pub struct AuthService<'a> {
    store: &'a dyn Store,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Register a new account and open a session for it.
    ///
    /// # Errors
    ///
    /// Rejects unparseable emails, weak passwords and already-registered
    /// addresses.
    pub async fn register(&self, email: &str, password: &str) -> Result<AuthOutcome, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;

        let user = User::new(email, hash_password(password)?);
        self.store.insert_user(&user).await.map_err(|e| match e {
            StoreError::AlreadyExists { .. } => AuthError::UserAlreadyExists,
            other => AuthError::Store(other),
        })?;
        info!(user_id = %user.id, "User registered");

        let token = self.open_session(&user).await?;
        Ok(AuthOutcome {
            user: CurrentUser::from(&user),
            token,
        })
    }

    /// Verify credentials and open a session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for unknown emails and
    /// wrong passwords alike.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthOutcome, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;
        let user = self
            .store
            .user_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        verify_password(password, &user.password_hash)?;

        let token = self.open_session(&user).await?;
        Ok(AuthOutcome {
            user: CurrentUser::from(&user),
            token,
        })
    }

    /// Resolve a bearer token to the user it belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] for unknown tokens and
    /// [`AuthError::SessionExpired`] for stale ones.
    pub async fn authenticate(&self, token: &str) -> Result<CurrentUser, AuthError> {
        let session = self
            .store
            .session_by_token(token)
            .await?
            .ok_or(AuthError::InvalidToken)?;
        if session.is_expired() {
            self.store.delete_session(token).await?;
            return Err(AuthError::SessionExpired);
        }
        let user = self
            .store
            .user(session.user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;
        Ok(CurrentUser::from(&user))
    }

    /// Invalidate a session token. Unknown tokens are fine.
    ///
    /// # Errors
    ///
    /// Returns an error when the store fails.
    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.store.delete_session(token).await?;
        Ok(())
    }

    /// Update the caller's display name or saved address.
    ///
    /// # Errors
    ///
    /// Rejects blank display names; returns [`AuthError::InvalidToken`] when
    /// the account no longer exists.
    pub async fn update_profile(
        &self,
        user_id: UserId,
        req: &UpdateProfile,
    ) -> Result<CurrentUser, AuthError> {
        let mut user = self
            .store
            .user(user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;
        if let Some(display_name) = &req.display_name {
            let display_name = display_name.trim();
            if display_name.is_empty() {
                return Err(AuthError::InvalidProfile(
                    "display name must not be blank".to_owned(),
                ));
            }
            user.display_name = display_name.to_owned();
        }
        if let Some(address) = &req.address {
            user.address = Some(address.clone());
        }
        user.updated_at = Utc::now();
        self.store.update_user(&user).await?;
        Ok(CurrentUser::from(&user))
    }

    /// All accounts, for the admin user list.
    ///
    /// # Errors
    ///
    /// Returns an error when the store fails.
    pub async fn list_users(&self) -> Result<Vec<CurrentUser>, AuthError> {
        let users = self.store.users().await?;
        Ok(users.iter().map(CurrentUser::from).collect())
    }

    /// Look up one account by id (admin view).
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UserNotFound`] when no such account exists.
    pub async fn get_user(&self, user_id: UserId) -> Result<CurrentUser, AuthError> {
        let user = self
            .store
            .user(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        Ok(CurrentUser::from(&user))
    }

    /// Delete an account. Open sessions for it become invalid tokens on
    /// their next use.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UserNotFound`] when no such account exists.
    pub async fn delete_user(&self, user_id: UserId) -> Result<(), AuthError> {
        if !self.store.delete_user(user_id).await? {
            return Err(AuthError::UserNotFound);
        }
        info!(user_id = %user_id, "User deleted");
        Ok(())
    }

    /// Grant or revoke the admin role on an account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UserNotFound`] when no such account exists.
    pub async fn set_admin(
        &self,
        user_id: UserId,
        is_admin: bool,
    ) -> Result<CurrentUser, AuthError> {
        let mut user = self
            .store
            .user(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        user.is_admin = is_admin;
        user.updated_at = Utc::now();
        self.store.update_user(&user).await?;
        info!(user_id = %user.id, is_admin, "Admin role changed");
        Ok(CurrentUser::from(&user))
    }

    async fn open_session(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        let session = AuthSession {
            token: generate_token(),
            user_id: user.id,
            created_at: now,
            expires_at: now + Duration::days(SESSION_TTL_DAYS),
        };
        self.store.insert_session(&session).await?;
        Ok(session.token)
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
