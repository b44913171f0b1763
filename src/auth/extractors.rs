use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::{debug, warn};

use super::repo_types::User;
use crate::{error::ApiError, state::AppState};

/// Header carrying the session token, both on requests and on login/register responses.
pub const AUTH_HEADER: &str = "x-auth";

/// A request whose `x-auth` token is signed by us and still listed on its owner.
pub struct AuthUser {
    pub user: User,
    pub token: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTH_HEADER)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| {
                debug!("missing x-auth header");
                ApiError::Unauthorized
            })?;

        let claims = state.keys.validate(token).map_err(|e| {
            warn!(error = %e, "token failed validation");
            ApiError::Unauthorized
        })?;

        let user = state
            .users
            .find_user_by_id(claims.sub)
            .await?
            .filter(|u| u.holds_token(claims.purpose, token))
            .ok_or_else(|| {
                warn!(user_id = %claims.sub, "token not recognized for user");
                ApiError::Unauthorized
            })?;

        Ok(AuthUser {
            user,
            token: token.to_owned(),
        })
    }
}
