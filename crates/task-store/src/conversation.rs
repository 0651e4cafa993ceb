//! Conversation CRUD operations.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::models::Conversation;

/// Create a new conversation and return it.
pub async fn create_conversation(
    pool: &SqlitePool,
    owner_id: &str,
    title: &str,
) -> Result<Conversation> {
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO conversations (id, owner_id, title)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(owner_id)
    .bind(title)
    .execute(pool)
    .await?;

    get_conversation(pool, owner_id, &id).await
}

/// Get a conversation by id.
pub async fn get_conversation(
    pool: &SqlitePool,
    owner_id: &str,
    id: &str,
) -> Result<Conversation> {
    sqlx::query_as::<_, Conversation>(
        r#"
        SELECT id, owner_id, title, is_active, created_at, updated_at
        FROM conversations
        WHERE id = ? AND owner_id = ?
        "#,
    )
    .bind(id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| StoreError::NotFound {
        entity: "Conversation",
        id: id.to_string(),
    })
}

/// List an owner's active conversations, most recently updated first.
pub async fn list_conversations(
    pool: &SqlitePool,
    owner_id: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<Conversation>> {
    let conversations = sqlx::query_as::<_, Conversation>(
        r#"
        SELECT id, owner_id, title, is_active, created_at, updated_at
        FROM conversations
        WHERE owner_id = ? AND is_active = 1
        ORDER BY updated_at DESC, id
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(owner_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(conversations)
}

/// Soft-delete a conversation. The row and its messages are kept.
pub async fn deactivate_conversation(pool: &SqlitePool, owner_id: &str, id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE conversations
        SET is_active = 0, updated_at = datetime('now')
        WHERE id = ? AND owner_id = ?
        "#,
    )
    .bind(id)
    .bind(owner_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound {
            entity: "Conversation",
            id: id.to_string(),
        });
    }

    Ok(())
}
