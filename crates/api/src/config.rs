//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `LACEUP_DATABASE_URL` - `PostgreSQL` connection string
//! - `LACEUP_BASE_URL` - Public URL for the API (used for checkout redirects)
//! - `STRIPE_SECRET_KEY` - Payment provider secret API key
//!
//! ## Optional
//! - `LACEUP_HOST` - Bind address (default: 127.0.0.1)
//! - `LACEUP_PORT` - Listen port (default: 8080)
//! - `STRIPE_API_BASE` - Payment provider API base (default: `https://api.stripe.com`)
//! - `CHECKOUT_SUCCESS_URL` - Redirect after successful payment
//!   (default: `<base_url>/checkout/success`)
//! - `CHECKOUT_CANCEL_URL` - Redirect after abandoned payment
//!   (default: `<base_url>/checkout/cancel`)

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the API
    pub base_url: String,
    /// Payment provider configuration
    pub payment: PaymentConfig,
}

/// Payment provider configuration.
///
/// Implements `Debug` manually to redact the secret key.
#[derive(Clone)]
pub struct PaymentConfig {
    /// Secret API key
    pub secret_key: SecretString,
    /// API base URL (overridable so tests can point at a stub)
    pub api_base: String,
    /// Where the provider redirects after a completed payment
    pub success_url: String,
    /// Where the provider redirects after an abandoned payment
    pub cancel_url: String,
}

impl std::fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("secret_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("success_url", &self.success_url)
            .field("cancel_url", &self.cancel_url)
            .finish()
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a required variable is missing or a
    /// value cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = required("LACEUP_DATABASE_URL")?.into();
        let base_url = required("LACEUP_BASE_URL")?;

        let host: IpAddr = optional("LACEUP_HOST")
            .unwrap_or_else(|| "127.0.0.1".to_owned())
            .parse()
            .map_err(|e| invalid("LACEUP_HOST", &e))?;

        let port: u16 = optional("LACEUP_PORT")
            .unwrap_or_else(|| "8080".to_owned())
            .parse()
            .map_err(|e| invalid("LACEUP_PORT", &e))?;

        let payment = PaymentConfig {
            secret_key: required("STRIPE_SECRET_KEY")?.into(),
            api_base: optional("STRIPE_API_BASE")
                .unwrap_or_else(|| "https://api.stripe.com".to_owned()),
            success_url: optional("CHECKOUT_SUCCESS_URL")
                .unwrap_or_else(|| format!("{base_url}/checkout/success")),
            cancel_url: optional("CHECKOUT_CANCEL_URL")
                .unwrap_or_else(|| format!("{base_url}/checkout/cancel")),
        };

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            payment,
        })
    }

    /// The socket address to bind the server to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn required(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_owned()))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn invalid(name: &str, err: &impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidEnvVar(name.to_owned(), err.to_string())
}
