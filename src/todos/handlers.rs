use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{CreateTodoRequest, PatchTodoRequest, TodoEnvelope, TodoList};
use super::repo_types::{Todo, TodoUpdate};
use crate::{auth::extractors::AuthUser, error::ApiError, extract::ApiJson, state::AppState};

pub fn todo_routes() -> Router<AppState> {
    Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route(
            "/todos/:id",
            get(get_todo).patch(update_todo).delete(delete_todo),
        )
}

/// A path segment that is not a UUID can't name any todo.
fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound("todo"))
}

fn clean_text(raw: Option<String>) -> Result<String, ApiError> {
    raw.map(|t| t.trim().to_owned())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::validation("text is required"))
}

fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

impl From<PatchTodoRequest> for TodoUpdate {
    fn from(body: PatchTodoRequest) -> Self {
        let completed = body.completed == Some(true);
        TodoUpdate {
            text: body.text.map(|t| t.trim().to_owned()),
            completed,
            completed_at: completed.then(now_millis),
        }
    }
}

#[instrument(skip(state, auth, body))]
pub async fn create_todo(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(body): ApiJson<CreateTodoRequest>,
) -> Result<Json<Todo>, ApiError> {
    let text = clean_text(body.text)?;
    let todo = state.todos.create_todo(auth.user.id, &text).await?;
    info!(user_id = %auth.user.id, todo_id = %todo.id, "todo created");
    Ok(Json(todo))
}

#[instrument(skip(state, auth))]
pub async fn list_todos(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<TodoList>, ApiError> {
    let todos = state.todos.list_todos(auth.user.id).await?;
    Ok(Json(TodoList { todos }))
}

#[instrument(skip(state, auth))]
pub async fn get_todo(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<TodoEnvelope>, ApiError> {
    let id = parse_id(&id)?;
    let todo = state
        .todos
        .find_todo(auth.user.id, id)
        .await?
        .ok_or(ApiError::NotFound("todo"))?;
    Ok(Json(TodoEnvelope { todo }))
}

#[instrument(skip(state, auth, body))]
pub async fn update_todo(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<PatchTodoRequest>,
) -> Result<Json<TodoEnvelope>, ApiError> {
    let id = parse_id(&id)?;
    if matches!(body.text.as_deref().map(str::trim), Some("")) {
        return Err(ApiError::validation("text must not be empty"));
    }
    let todo = state
        .todos
        .update_todo(auth.user.id, id, body.into())
        .await?
        .ok_or(ApiError::NotFound("todo"))?;
    info!(
        user_id = %auth.user.id,
        todo_id = %todo.id,
        completed = todo.completed,
        "todo updated"
    );
    Ok(Json(TodoEnvelope { todo }))
}

#[instrument(skip(state, auth))]
pub async fn delete_todo(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<TodoEnvelope>, ApiError> {
    let id = parse_id(&id)?;
    let todo = state
        .todos
        .delete_todo(auth.user.id, id)
        .await?
        .ok_or(ApiError::NotFound("todo"))?;
    info!(user_id = %auth.user.id, todo_id = %todo.id, "todo deleted");
    Ok(Json(TodoEnvelope { todo }))
}
