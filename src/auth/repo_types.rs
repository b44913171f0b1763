use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::token::TokenPurpose;

/// One live session token held by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AuthToken {
    pub purpose: String,
    pub token: String,
}

impl AuthToken {
    pub fn new(purpose: TokenPurpose, token: impl Into<String>) -> Self {
        Self {
            purpose: purpose.as_str().to_owned(),
            token: token.into(),
        }
    }
}

/// User record in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,                     // unique user ID
    pub email: String,                // normalized email
    #[serde(skip_serializing)]
    pub password_hash: String,        // Argon2 hash, not exposed in JSON
    #[serde(skip_serializing)]
    pub tokens: Vec<AuthToken>,       // live sessions, oldest first
    pub created_at: OffsetDateTime,   // creation timestamp
}

impl User {
    pub fn holds_token(&self, purpose: TokenPurpose, token: &str) -> bool {
        self.tokens
            .iter()
            .any(|t| t.purpose == purpose.as_str() && t.token == token)
    }
}

/// A user about to be inserted. The id is picked up front so the first
/// session token can be signed before the insert.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub tokens: Vec<AuthToken>,
}

impl NewUser {
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            password_hash: password_hash.into(),
            tokens: Vec::new(),
        }
    }

    pub fn with_token(mut self, token: AuthToken) -> Self {
        self.tokens.push(token);
        self
    }
}

/// Row shape of the `users` table; tokens live in `user_tokens`.
#[derive(Debug, FromRow)]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: OffsetDateTime,
}

impl UserRow {
    pub(crate) fn with_tokens(self, tokens: Vec<AuthToken>) -> User {
        User {
            id: self.id,
            email: self.email,
            password_hash: self.password_hash,
            tokens,
            created_at: self.created_at,
        }
    }
}
