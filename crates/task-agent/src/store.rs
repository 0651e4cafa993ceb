//! The task store adapter boundary.
//!
//! Tool execution never sees a raw store error: every operation returns a
//! [`StoreOutcome`] value whose `success` flag and message flow back to the
//! model as a tool result. The only fallible method is [`TaskStore::fetch_all`],
//! which the resolver uses and retries.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use task_store::{task, user, Database, NewTask, StoreError, Task, TaskFilter, TaskPatch};
use tracing::warn;

/// The task shape fed to the model and returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskView {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub completed: bool,
    pub priority: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    pub created_at: String,
}

impl From<Task> for TaskView {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            completed: task.completed,
            priority: task.priority,
            tags: task.tags,
            due_date: task.due_date,
            created_at: task.created_at,
        }
    }
}

/// Structured result of one store operation.
///
/// Failures are values, never errors: a failed operation carries
/// `success = false` and a user-legible message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<TaskView>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<usize>,
}

impl StoreOutcome {
    /// Create a successful outcome.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            ..Default::default()
        }
    }

    /// Create a failed outcome.
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            ..Default::default()
        }
    }

    /// Attach the task this outcome refers to.
    pub fn with_task(mut self, id: impl Into<String>, title: impl Into<String>) -> Self {
        self.task_id = Some(id.into());
        self.task_title = Some(title.into());
        self
    }

    /// Attach a completion state.
    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    /// Attach a task list.
    pub fn with_tasks(mut self, tasks: Vec<TaskView>) -> Self {
        self.total_count = Some(tasks.len());
        self.tasks = Some(tasks);
        self
    }
}

/// Owner-scoped task operations consumed by the tool runner.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Add a task.
    async fn add_task(&self, owner: &str, fields: NewTask) -> StoreOutcome;

    /// List tasks with filters.
    async fn list_tasks(&self, owner: &str, filter: TaskFilter) -> StoreOutcome;

    /// Get a single task, if it exists for this owner.
    async fn get_task(&self, owner: &str, id: &str) -> Option<TaskView>;

    /// Apply a partial update.
    async fn update_task(&self, owner: &str, id: &str, patch: TaskPatch) -> StoreOutcome;

    /// Set the completion flag.
    async fn set_completion(&self, owner: &str, id: &str, completed: bool) -> StoreOutcome;

    /// Delete a task.
    async fn delete_task(&self, owner: &str, id: &str) -> StoreOutcome;

    /// Resolve the calling owner's identity.
    async fn identity(&self, owner: &str) -> StoreOutcome;

    /// Fetch the owner's full task list in store order.
    ///
    /// Unlike the other operations this is fallible; the resolver retries it
    /// and converts persistent failure into a resolution failure.
    async fn fetch_all(&self, owner: &str) -> Result<Vec<TaskView>, StoreError>;
}

/// [`TaskStore`] implementation over the SQLite persistence layer.
#[derive(Debug, Clone)]
pub struct SqliteTaskStore {
    db: Database,
}

impl SqliteTaskStore {
    /// Wrap a connected database.
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    async fn add_task(&self, owner: &str, fields: NewTask) -> StoreOutcome {
        match task::create_task(self.db.pool(), owner, &fields).await {
            Ok(created) => {
                StoreOutcome::ok(format!("Task '{}' added successfully!", created.title))
                    .with_task(created.id, created.title)
            }
            Err(e) => {
                warn!("add_task failed for owner {}: {}", owner, e);
                StoreOutcome::fail(format!("Could not add the task: {}", e))
            }
        }
    }

    async fn list_tasks(&self, owner: &str, filter: TaskFilter) -> StoreOutcome {
        match task::list_tasks(self.db.pool(), owner, filter).await {
            Ok(tasks) => {
                let views: Vec<TaskView> = tasks.into_iter().map(TaskView::from).collect();
                StoreOutcome::ok(format!("Found {} tasks.", views.len())).with_tasks(views)
            }
            Err(e) => {
                warn!("list_tasks failed for owner {}: {}", owner, e);
                StoreOutcome::fail(format!("Could not list tasks: {}", e))
            }
        }
    }

    async fn get_task(&self, owner: &str, id: &str) -> Option<TaskView> {
        task::get_task(self.db.pool(), owner, id)
            .await
            .ok()
            .map(TaskView::from)
    }

    async fn update_task(&self, owner: &str, id: &str, patch: TaskPatch) -> StoreOutcome {
        match task::update_task(self.db.pool(), owner, id, &patch).await {
            Ok(updated) => {
                StoreOutcome::ok(format!("Task '{}' updated successfully!", updated.title))
                    .with_task(updated.id, updated.title)
                    .with_completed(updated.completed)
            }
            Err(StoreError::NotFound { .. }) => {
                StoreOutcome::fail(format!("Task not found: {}", id))
            }
            Err(e) => {
                warn!("update_task failed for owner {}: {}", owner, e);
                StoreOutcome::fail(format!("Could not update the task: {}", e))
            }
        }
    }

    async fn set_completion(&self, owner: &str, id: &str, completed: bool) -> StoreOutcome {
        match task::set_completed(self.db.pool(), owner, id, completed).await {
            Ok(updated) => {
                let message = if completed {
                    format!("Task '{}' marked as completed!", updated.title)
                } else {
                    format!("Task '{}' marked as incomplete.", updated.title)
                };
                StoreOutcome::ok(message)
                    .with_task(updated.id, updated.title)
                    .with_completed(completed)
            }
            Err(StoreError::NotFound { .. }) => {
                StoreOutcome::fail(format!("Task not found: {}", id))
            }
            Err(e) => {
                warn!("set_completion failed for owner {}: {}", owner, e);
                StoreOutcome::fail(format!("Could not update the task: {}", e))
            }
        }
    }

    async fn delete_task(&self, owner: &str, id: &str) -> StoreOutcome {
        // Fetch first so the confirmation can name the task.
        let title = self.get_task(owner, id).await.map(|t| t.title);
        match task::delete_task(self.db.pool(), owner, id).await {
            Ok(()) => {
                let mut outcome = StoreOutcome::ok("Task deleted successfully!");
                outcome.task_id = Some(id.to_string());
                outcome.task_title = title;
                outcome
            }
            Err(StoreError::NotFound { .. }) => {
                StoreOutcome::fail(format!("Task not found: {}", id))
            }
            Err(e) => {
                warn!("delete_task failed for owner {}: {}", owner, e);
                StoreOutcome::fail(format!("Could not delete the task: {}", e))
            }
        }
    }

    async fn identity(&self, owner: &str) -> StoreOutcome {
        match user::get_user(self.db.pool(), owner).await {
            Ok(found) => {
                StoreOutcome::ok(format!("You are {} ({}).", found.name, found.email))
            }
            Err(e) => {
                warn!("identity lookup failed for owner {}: {}", owner, e);
                StoreOutcome::fail("Could not look up your identity.")
            }
        }
    }

    async fn fetch_all(&self, owner: &str) -> Result<Vec<TaskView>, StoreError> {
        let tasks = task::list_tasks(self.db.pool(), owner, TaskFilter::default()).await?;
        Ok(tasks.into_iter().map(TaskView::from).collect())
    }
}
