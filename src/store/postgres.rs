//! Postgres-backed credential store.
//!
//! Email uniqueness is enforced by the `users_email_key` unique index; the
//! store maps constraint violations and pool failures onto the error
//! taxonomy instead of leaking driver messages to flows.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{CredentialStore, NewIdentity, Role, UserIdentity};
use crate::error::StoreError;

pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

type IdentityRow = (
    Uuid,
    String,
    String,
    String,
    String,
    Option<String>,
    DateTime<Utc>,
);

fn row_into_identity(row: IdentityRow) -> Result<UserIdentity, StoreError> {
    let (id, username, email, password_hash, role, photo, created_at) = row;
    let role = role.parse::<Role>().map_err(StoreError::Unexpected)?;

    Ok(UserIdentity {
        id,
        username,
        email,
        password_hash,
        role,
        photo,
        created_at,
    })
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    let message = err.to_string();

    if message.contains("duplicate key") || message.contains("unique constraint") {
        StoreError::DuplicateEmail
    } else if message.contains("pool") || message.contains("connect") {
        StoreError::Unavailable(message)
    } else {
        StoreError::Unexpected(message)
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn insert_identity(&self, new: NewIdentity) -> Result<UserIdentity, StoreError> {
        let id = Uuid::new_v4();
        let created_at = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, role, photo, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(id)
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.role.as_str())
        .bind(&new.photo)
        .bind(created_at)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(UserIdentity {
            id,
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            photo: new.photo,
            created_at,
        })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserIdentity>, StoreError> {
        let row = sqlx::query_as::<_, IdentityRow>(
            "SELECT id, username, email, password_hash, role, photo, created_at
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(row_into_identity).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserIdentity>, StoreError> {
        let row = sqlx::query_as::<_, IdentityRow>(
            "SELECT id, username, email, password_hash, role, photo, created_at
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(row_into_identity).transpose()
    }
}
