//! Message append and retrieval.
//!
//! Messages are append-only; there is no update or delete. Ordering within a
//! conversation is the autoincrement id, which is strictly increasing.

use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::StoredMessage;

/// Append a message to a conversation and return its id.
///
/// Every append bumps the conversation's `updated_at`.
pub async fn append_message(
    pool: &SqlitePool,
    conversation_id: &str,
    sender: &str,
    content: &str,
    kind: &str,
    metadata: Option<&str>,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO messages (conversation_id, sender, content, kind, metadata)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(conversation_id)
    .bind(sender)
    .bind(content)
    .bind(kind)
    .bind(metadata)
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        UPDATE conversations SET updated_at = datetime('now') WHERE id = ?
        "#,
    )
    .bind(conversation_id)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// List a conversation's messages in append order.
pub async fn list_messages(
    pool: &SqlitePool,
    conversation_id: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<StoredMessage>> {
    let messages = sqlx::query_as::<_, StoredMessage>(
        r#"
        SELECT id, conversation_id, sender, content, kind, metadata, created_at
        FROM messages
        WHERE conversation_id = ?
        ORDER BY id
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(conversation_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(messages)
}

/// Count messages in a conversation.
pub async fn count_messages(pool: &SqlitePool, conversation_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM messages WHERE conversation_id = ?
        "#,
    )
    .bind(conversation_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}
