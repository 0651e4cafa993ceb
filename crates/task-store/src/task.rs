//! Task CRUD operations.
//!
//! Every operation is scoped to an owner id in the WHERE clause; a task id
//! belonging to another owner behaves exactly like a missing id.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::models::{NewTask, StatusFilter, Task, TaskFilter, TaskPatch};
use crate::validation;

/// Create a new task and return it.
pub async fn create_task(pool: &SqlitePool, owner_id: &str, fields: &NewTask) -> Result<Task> {
    validation::validate_title(&fields.title)?;
    validation::validate_description(fields.description.as_deref())?;
    validation::validate_tags(fields.tags.as_deref())?;
    validation::validate_ai_context(fields.ai_context.as_deref())?;

    let priority = fields.priority.as_deref().unwrap_or("medium");
    validation::validate_priority(priority)?;

    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO tasks (id, owner_id, title, description, completed, priority,
                           tags, due_date, ai_generated, ai_context)
        VALUES (?, ?, ?, ?, 0, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(owner_id)
    .bind(fields.title.trim())
    .bind(&fields.description)
    .bind(priority)
    .bind(&fields.tags)
    .bind(&fields.due_date)
    .bind(fields.ai_generated)
    .bind(&fields.ai_context)
    .execute(pool)
    .await?;

    get_task(pool, owner_id, &id).await
}

/// Get a task by id.
pub async fn get_task(pool: &SqlitePool, owner_id: &str, id: &str) -> Result<Task> {
    sqlx::query_as::<_, Task>(
        r#"
        SELECT id, owner_id, title, description, completed, priority,
               tags, due_date, ai_generated, ai_context, created_at, updated_at
        FROM tasks
        WHERE id = ? AND owner_id = ?
        "#,
    )
    .bind(id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| StoreError::NotFound {
        entity: "Task",
        id: id.to_string(),
    })
}

/// List tasks for an owner with optional status filter and paging.
///
/// Ordering is stable store order (creation time, then insertion order) so that the
/// positions shown to users stay consistent between fetches.
pub async fn list_tasks(pool: &SqlitePool, owner_id: &str, filter: TaskFilter) -> Result<Vec<Task>> {
    let status_clause = match filter.status {
        StatusFilter::All => "",
        StatusFilter::Pending => "AND completed = 0",
        StatusFilter::Completed => "AND completed = 1",
    };

    let query = format!(
        r#"
        SELECT id, owner_id, title, description, completed, priority,
               tags, due_date, ai_generated, ai_context, created_at, updated_at
        FROM tasks
        WHERE owner_id = ? {}
        ORDER BY created_at, rowid
        LIMIT ? OFFSET ?
        "#,
        status_clause
    );

    let tasks = sqlx::query_as::<_, Task>(&query)
        .bind(owner_id)
        .bind(filter.limit.unwrap_or(-1))
        .bind(filter.offset.unwrap_or(0))
        .fetch_all(pool)
        .await?;

    Ok(tasks)
}

/// Update a task. `None` fields in the patch keep their stored values.
pub async fn update_task(
    pool: &SqlitePool,
    owner_id: &str,
    id: &str,
    patch: &TaskPatch,
) -> Result<Task> {
    if let Some(ref title) = patch.title {
        validation::validate_title(title)?;
    }
    validation::validate_description(patch.description.as_deref())?;
    validation::validate_tags(patch.tags.as_deref())?;
    validation::validate_ai_context(patch.ai_context.as_deref())?;
    if let Some(ref priority) = patch.priority {
        validation::validate_priority(priority)?;
    }

    let result = sqlx::query(
        r#"
        UPDATE tasks
        SET title = COALESCE(?, title),
            description = COALESCE(?, description),
            completed = COALESCE(?, completed),
            priority = COALESCE(?, priority),
            tags = COALESCE(?, tags),
            due_date = COALESCE(?, due_date),
            ai_context = COALESCE(?, ai_context),
            updated_at = datetime('now')
        WHERE id = ? AND owner_id = ?
        "#,
    )
    .bind(&patch.title)
    .bind(&patch.description)
    .bind(patch.completed)
    .bind(&patch.priority)
    .bind(&patch.tags)
    .bind(&patch.due_date)
    .bind(&patch.ai_context)
    .bind(id)
    .bind(owner_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound {
            entity: "Task",
            id: id.to_string(),
        });
    }

    get_task(pool, owner_id, id).await
}

/// Set a task's completion flag and return the updated task.
pub async fn set_completed(
    pool: &SqlitePool,
    owner_id: &str,
    id: &str,
    completed: bool,
) -> Result<Task> {
    let result = sqlx::query(
        r#"
        UPDATE tasks
        SET completed = ?, updated_at = datetime('now')
        WHERE id = ? AND owner_id = ?
        "#,
    )
    .bind(completed)
    .bind(id)
    .bind(owner_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound {
            entity: "Task",
            id: id.to_string(),
        });
    }

    get_task(pool, owner_id, id).await
}

/// Delete a task by id.
pub async fn delete_task(pool: &SqlitePool, owner_id: &str, id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM tasks
        WHERE id = ? AND owner_id = ?
        "#,
    )
    .bind(id)
    .bind(owner_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound {
            entity: "Task",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Count tasks for an owner.
pub async fn count_tasks(pool: &SqlitePool, owner_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM tasks WHERE owner_id = ?
        "#,
    )
    .bind(owner_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}
