//! User CRUD operations.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::models::User;

/// Create a new user and return it.
pub async fn create_user(pool: &SqlitePool, name: &str, email: &str) -> Result<User> {
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO users (id, name, email)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(name)
    .bind(email)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return StoreError::AlreadyExists {
                    entity: "User",
                    id: email.to_string(),
                };
            }
        }
        StoreError::Sqlx(e)
    })?;

    get_user(pool, &id).await
}

/// Get a user by id.
pub async fn get_user(pool: &SqlitePool, id: &str) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, email, created_at
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| StoreError::NotFound {
        entity: "User",
        id: id.to_string(),
    })
}
