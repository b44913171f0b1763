//! Persistence contracts used by the handlers.
//!
//! Every token-list mutation is one atomic store call keyed by user id, so
//! concurrent logins and logouts for the same user never lose updates.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::repo_types::{AuthToken, NewUser, User};
use crate::todos::repo_types::{Todo, TodoUpdate};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,

    #[error("user not found")]
    UserNotFound,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts the user together with its initial tokens, all or nothing.
    /// Fails with [`StoreError::DuplicateEmail`] when the email is taken.
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    /// Fails with [`StoreError::UserNotFound`] when no such user exists.
    async fn push_token(&self, user_id: Uuid, token: AuthToken) -> StoreResult<()>;
    /// Returns whether the token was present.
    async fn remove_token(&self, user_id: Uuid, token: &str) -> StoreResult<bool>;
    /// Returns how many tokens were dropped.
    async fn clear_tokens(&self, user_id: Uuid) -> StoreResult<u64>;
}

#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn create_todo(&self, owner_id: Uuid, text: &str) -> StoreResult<Todo>;
    async fn list_todos(&self, owner_id: Uuid) -> StoreResult<Vec<Todo>>;
    async fn find_todo(&self, owner_id: Uuid, id: Uuid) -> StoreResult<Option<Todo>>;
    async fn update_todo(
        &self,
        owner_id: Uuid,
        id: Uuid,
        update: TodoUpdate,
    ) -> StoreResult<Option<Todo>>;
    async fn delete_todo(&self, owner_id: Uuid, id: Uuid) -> StoreResult<Option<Todo>>;
}
