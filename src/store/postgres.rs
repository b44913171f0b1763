use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{StoreError, StoreResult, TodoStore, UserStore};
use crate::auth::repo_types::{AuthToken, NewUser, User, UserRow};
use crate::todos::repo_types::{Todo, TodoUpdate};

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { db })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .context("run migrations")?;
        Ok(())
    }

    async fn load_tokens(&self, user_id: Uuid) -> StoreResult<Vec<AuthToken>> {
        let tokens = sqlx::query_as::<_, AuthToken>(
            r#"
            SELECT purpose, token
            FROM user_tokens
            WHERE user_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(tokens)
    }

    async fn hydrate(&self, row: Option<UserRow>) -> StoreResult<Option<User>> {
        match row {
            Some(row) => {
                let tokens = self.load_tokens(row.id).await?;
                Ok(Some(row.with_tokens(tokens)))
            }
            None => Ok(None),
        }
    }
}

fn map_insert_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StoreError::DuplicateEmail;
        }
    }
    StoreError::Database(e)
}

fn map_token_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_foreign_key_violation() {
            return StoreError::UserNotFound;
        }
    }
    StoreError::Database(e)
}

/// Insert one token row within a transaction.
async fn insert_token_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    token: &AuthToken,
) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO user_tokens (user_id, purpose, token)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(user_id)
    .bind(&token.purpose)
    .bind(&token.token)
    .execute(&mut **tx)
    .await
    .map_err(map_token_error)?;
    Ok(())
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let mut tx = self.db.begin().await?;
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(new_user.id)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_insert_error)?;
        for token in &new_user.tokens {
            insert_token_tx(&mut tx, row.id, token).await?;
        }
        tx.commit().await?;
        Ok(row.with_tokens(new_user.tokens))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        self.hydrate(row).await
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        self.hydrate(row).await
    }

    async fn push_token(&self, user_id: Uuid, token: AuthToken) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_tokens (user_id, purpose, token)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user_id)
        .bind(&token.purpose)
        .bind(&token.token)
        .execute(&self.db)
        .await
        .map_err(map_token_error)?;
        Ok(())
    }

    async fn remove_token(&self, user_id: Uuid, token: &str) -> StoreResult<bool> {
        let res = sqlx::query(r#"DELETE FROM user_tokens WHERE user_id = $1 AND token = $2"#)
            .bind(user_id)
            .bind(token)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn clear_tokens(&self, user_id: Uuid) -> StoreResult<u64> {
        let res = sqlx::query(r#"DELETE FROM user_tokens WHERE user_id = $1"#)
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected())
    }
}

#[async_trait]
impl TodoStore for PgStore {
    async fn create_todo(&self, owner_id: Uuid, text: &str) -> StoreResult<Todo> {
        let todo = sqlx::query_as::<_, Todo>(
            r#"
            INSERT INTO todos (id, owner_id, text)
            VALUES ($1, $2, $3)
            RETURNING id, owner_id, text, completed, completed_at, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(text)
        .fetch_one(&self.db)
        .await?;
        Ok(todo)
    }

    async fn list_todos(&self, owner_id: Uuid) -> StoreResult<Vec<Todo>> {
        let rows = sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, owner_id, text, completed, completed_at, created_at
            FROM todos
            WHERE owner_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_todo(&self, owner_id: Uuid, id: Uuid) -> StoreResult<Option<Todo>> {
        let row = sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, owner_id, text, completed, completed_at, created_at
            FROM todos
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn update_todo(
        &self,
        owner_id: Uuid,
        id: Uuid,
        update: TodoUpdate,
    ) -> StoreResult<Option<Todo>> {
        let row = sqlx::query_as::<_, Todo>(
            r#"
            UPDATE todos
               SET text = COALESCE($3, text),
                   completed = $4,
                   completed_at = $5
             WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, text, completed, completed_at, created_at
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(update.text)
        .bind(update.completed)
        .bind(update.completed_at)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete_todo(&self, owner_id: Uuid, id: Uuid) -> StoreResult<Option<Todo>> {
        let row = sqlx::query_as::<_, Todo>(
            r#"
            DELETE FROM todos
             WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, text, completed, completed_at, created_at
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }
}
