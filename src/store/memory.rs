use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, StoreResult, TodoStore, UserStore};
use crate::auth::repo_types::{AuthToken, NewUser, User};
use crate::todos::repo_types::{Todo, TodoUpdate};

/// Process-local store. Each mutation holds the write lock for its whole
/// read-modify-write.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    todos: RwLock<Vec<Todo>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == new_user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        let user = User {
            id: new_user.id,
            email: new_user.email,
            password_hash: new_user.password_hash,
            tokens: new_user.tokens,
            created_at: OffsetDateTime::now_utc(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn push_token(&self, user_id: Uuid, token: AuthToken) -> StoreResult<()> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&user_id).ok_or(StoreError::UserNotFound)?;
        user.tokens.push(token);
        Ok(())
    }

    async fn remove_token(&self, user_id: Uuid, token: &str) -> StoreResult<bool> {
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(&user_id) else {
            return Ok(false);
        };
        let before = user.tokens.len();
        user.tokens.retain(|t| t.token != token);
        Ok(user.tokens.len() != before)
    }

    async fn clear_tokens(&self, user_id: Uuid) -> StoreResult<u64> {
        let mut users = self.users.write().await;
        Ok(users
            .get_mut(&user_id)
            .map(|u| std::mem::take(&mut u.tokens).len() as u64)
            .unwrap_or(0))
    }
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn create_todo(&self, owner_id: Uuid, text: &str) -> StoreResult<Todo> {
        let todo = Todo {
            id: Uuid::new_v4(),
            owner_id,
            text: text.to_owned(),
            completed: false,
            completed_at: None,
            created_at: OffsetDateTime::now_utc(),
        };
        self.todos.write().await.push(todo.clone());
        Ok(todo)
    }

    async fn list_todos(&self, owner_id: Uuid) -> StoreResult<Vec<Todo>> {
        let todos = self.todos.read().await;
        Ok(todos.iter().filter(|t| t.owner_id == owner_id).cloned().collect())
    }

    async fn find_todo(&self, owner_id: Uuid, id: Uuid) -> StoreResult<Option<Todo>> {
        let todos = self.todos.read().await;
        Ok(todos
            .iter()
            .find(|t| t.id == id && t.owner_id == owner_id)
            .cloned())
    }

    async fn update_todo(
        &self,
        owner_id: Uuid,
        id: Uuid,
        update: TodoUpdate,
    ) -> StoreResult<Option<Todo>> {
        let mut todos = self.todos.write().await;
        let Some(todo) = todos.iter_mut().find(|t| t.id == id && t.owner_id == owner_id) else {
            return Ok(None);
        };
        update.apply(todo);
        Ok(Some(todo.clone()))
    }

    async fn delete_todo(&self, owner_id: Uuid, id: Uuid) -> StoreResult<Option<Todo>> {
        let mut todos = self.todos.write().await;
        let pos = todos.iter().position(|t| t.id == id && t.owner_id == owner_id);
        Ok(pos.map(|i| todos.remove(i)))
    }
}
