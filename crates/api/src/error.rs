//! Unified error handling.
//!
//! Provides a unified [`ApiError`] type mapping every failure in the error
//! taxonomy to its HTTP status. All route handlers return
//! `Result<T, ApiError>`. Server-side failures are logged here, at the
//! response boundary, so handlers never have to.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use laceup_core::{OrderStatus, TransitionError};

use crate::services::auth::AuthError;
use crate::services::payment::PaymentError;
use crate::store::StoreError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// An entity (shoe/color/size/cart/order/user) is absent.
    #[error("{0} not found")]
    NotFound(String),

    /// Requested quantity exceeds the available stock.
    #[error("Insufficient stock for {0}")]
    InsufficientStock(String),

    /// Quantity missing, zero or otherwise unusable.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Checkout on a cart with no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// Cancellation of an already-canceled order.
    #[error("Order is already canceled")]
    AlreadyCanceled,

    /// Status transition not defined by the lifecycle state machine.
    #[error("Cannot transition order from {from} to {to}")]
    InvalidStatusTransition {
        from: OrderStatus,
        to: OrderStatus,
    },

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Duplicate entity (color name, size value, brand+model, email).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Missing or invalid credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Payment provider operation failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl From<TransitionError> for ApiError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::AlreadyCanceled => Self::AlreadyCanceled,
            TransitionError::Invalid { from, to } => Self::InvalidStatusTransition { from, to },
        }
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientStock(_)
            | Self::InvalidQuantity(_)
            | Self::EmptyCart
            | Self::AlreadyCanceled
            | Self::InvalidStatusTransition { .. }
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::InvalidToken | AuthError::SessionExpired => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::UserNotFound => StatusCode::NOT_FOUND,
                AuthError::WeakPassword(_)
                | AuthError::InvalidProfile(_)
                | AuthError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
                AuthError::Store(_) | AuthError::PasswordHash(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Payment(_) => StatusCode::BAD_GATEWAY,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message exposed to clients. Internal details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            Self::Store(_) => "Internal server error".to_owned(),
            Self::Payment(_) => "Payment provider error".to_owned(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid credentials".to_owned(),
                AuthError::InvalidToken | AuthError::SessionExpired => {
                    "Invalid or expired token".to_owned()
                }
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_owned()
                }
                AuthError::UserNotFound => "User not found".to_owned(),
                AuthError::WeakPassword(msg) | AuthError::InvalidProfile(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_owned(),
                AuthError::Store(_) | AuthError::PasswordHash(_) => {
                    "Internal server error".to_owned()
                }
            },
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request error");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let body = Json(json!({
            "success": false,
            "message": self.public_message(),
        }));

        (status, body).into_response()
    }
}

/// Result type alias for [`ApiError`].
pub type Result<T> = std::result::Result<T, ApiError>;
