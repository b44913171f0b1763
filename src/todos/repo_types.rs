use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Todo {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub owner_id: Uuid,
    pub text: String,
    pub completed: bool,
    pub completed_at: Option<i64>, // unix millis
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Field changes applied by PATCH; `text: None` keeps the current text.
#[derive(Debug, Clone)]
pub struct TodoUpdate {
    pub text: Option<String>,
    pub completed: bool,
    pub completed_at: Option<i64>,
}

impl TodoUpdate {
    pub(crate) fn apply(self, todo: &mut Todo) {
        if let Some(text) = self.text {
            todo.text = text;
        }
        todo.completed = self.completed;
        todo.completed_at = self.completed_at;
    }
}
