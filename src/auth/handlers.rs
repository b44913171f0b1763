use axum::{
    extract::State,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{Credentials, PublicUser, RevokedTokens},
        extractors::{AuthUser, AUTH_HEADER},
        password::{hash_password_blocking, verify_password_blocking},
        repo_types::{AuthToken, NewUser, User},
        token::TokenPurpose,
    },
    error::ApiError,
    extract::ApiJson,
    state::AppState,
};

const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/users/login", post(login))
        .route("/users/me", get(get_me))
        .route("/users/me/token", delete(logout))
        .route("/users/me/tokens", delete(logout_everywhere))
}

/// Signs a fresh auth token and appends it to the user's token list.
async fn start_session(state: &AppState, user: &User) -> Result<String, ApiError> {
    let token = state.keys.issue(user.id, TokenPurpose::Auth)?;
    state
        .users
        .push_token(user.id, AuthToken::new(TokenPurpose::Auth, token.clone()))
        .await?;
    Ok(token)
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<Credentials>,
) -> Result<impl IntoResponse, ApiError> {
    let email = normalize_email(payload.email.as_deref().unwrap_or_default());
    let password = payload.password.unwrap_or_default();

    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::validation("Invalid email"));
    }

    if password.chars().count() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(ApiError::validation("Password too short"));
    }

    let hash = hash_password_blocking(password).await?;

    // The first session is written together with the user row.
    let new_user = NewUser::new(email.clone(), hash);
    let token = state.keys.issue(new_user.id, TokenPurpose::Auth)?;
    let new_user = new_user.with_token(AuthToken::new(TokenPurpose::Auth, token.clone()));

    let user = state.users.create_user(new_user).await.map_err(|e| {
        warn!(email = %email, error = %e, "create user failed");
        ApiError::from(e)
    })?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(([(AUTH_HEADER, token)], Json(PublicUser::from(&user))))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<Credentials>,
) -> Result<impl IntoResponse, ApiError> {
    let email = normalize_email(payload.email.as_deref().unwrap_or_default());
    let password = payload.password.unwrap_or_default();

    let Some(user) = state.users.find_user_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(ApiError::Unauthorized);
    };

    if !verify_password_blocking(password, user.password_hash.clone()).await? {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthorized);
    }

    let token = start_session(&state, &user).await?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(([(AUTH_HEADER, token)], Json(PublicUser::from(&user))))
}

#[instrument(skip(auth))]
pub async fn get_me(auth: AuthUser) -> Json<PublicUser> {
    Json(PublicUser::from(&auth.user))
}

#[instrument(skip(state, auth))]
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> Result<(), ApiError> {
    state.users.remove_token(auth.user.id, &auth.token).await?;
    info!(user_id = %auth.user.id, "user logged out");
    Ok(())
}

#[instrument(skip(state, auth))]
pub async fn logout_everywhere(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<RevokedTokens>, ApiError> {
    let revoked = state.users.clear_tokens(auth.user.id).await?;
    info!(user_id = %auth.user.id, revoked, "all sessions revoked");
    Ok(Json(RevokedTokens { revoked }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("andrew@example.com"));
        assert!(!is_valid_email("example"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn email_is_trimmed_and_lowercased() {
        assert_eq!(normalize_email("   JC@Example.COM  "), "jc@example.com");
    }

    #[test]
    fn public_user_serialization() {
        let response = PublicUser {
            id: uuid::Uuid::new_v4(),
            email: "test@example.com".to_string(),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["email"], "test@example.com");
        assert!(json.get("id").is_some());
        assert!(json.get("password_hash").is_none());
    }
}
