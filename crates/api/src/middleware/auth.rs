//! Bearer-token authentication extractors.
//!
//! Handlers declare their access level by taking [`RequireAuth`] or
//! [`RequireAdmin`] as an argument; rejection happens before the handler
//! body runs and renders through [`ApiError`] like any other failure.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::error::ApiError;
use crate::models::CurrentUser;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Extracts the authenticated caller from the `Authorization` header.
pub struct RequireAuth(pub CurrentUser);

/// Like [`RequireAuth`], but additionally requires the admin flag.
pub struct RequireAdmin(pub CurrentUser);

/// Pull the bearer token out of the request headers.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_owned()))
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?.to_owned();
        let user = AuthService::new(state.store()).authenticate(&token).await?;
        Ok(Self(user))
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;
        if !user.is_admin {
            return Err(ApiError::Forbidden(
                "Administrator access required".to_owned(),
            ));
        }
        Ok(Self(user))
    }
}
