//! Caller identity extractors.
//!
//! Authentication itself happens upstream; the identity proxy forwards the
//! signed-in user's id in a header (`x-user-id` unless configured otherwise).

use super::AppState;
use crate::errors::Error;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// A signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser(pub String);

/// A signed-in user listed in `admin_user_ids`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminUser(pub String);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(state.config.server.identity_header_name())
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| Self(id.to_string()))
            .ok_or(Error::Unauthorized)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(clerk_id) = AuthUser::from_request_parts(parts, state).await?;
        if state.config.is_admin(&clerk_id) {
            Ok(Self(clerk_id))
        } else {
            Err(Error::Forbidden)
        }
    }
}
