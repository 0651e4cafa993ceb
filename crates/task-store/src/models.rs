//! Store models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A user in the system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    /// UUID string.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Email address (unique).
    pub email: String,
    /// Creation timestamp.
    pub created_at: String,
}

/// A task owned by a single user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Task {
    /// UUID string, stable for the task's lifetime.
    pub id: String,
    /// Owning user's id.
    pub owner_id: String,
    /// Short title.
    pub title: String,
    /// Longer description, if any.
    pub description: Option<String>,
    /// Completion flag.
    pub completed: bool,
    /// Priority: "low", "medium", or "high".
    pub priority: String,
    /// Comma-separated tags, if any.
    pub tags: Option<String>,
    /// Due date as an ISO-8601 string, if any.
    pub due_date: Option<String>,
    /// Whether an AI action created this task.
    pub ai_generated: bool,
    /// Free-text note recording why an AI action touched this task.
    pub ai_context: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

/// A chat conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Conversation {
    /// UUID string.
    pub id: String,
    /// Owning user's id.
    pub owner_id: String,
    /// Display title.
    pub title: String,
    /// Active flag; conversations are deactivated, never hard-deleted.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: String,
    /// Bumped on every appended message.
    pub updated_at: String,
}

/// Sender role of a stored message.
pub const SENDER_USER: &str = "USER";
/// Sender role of a stored message.
pub const SENDER_ASSISTANT: &str = "ASSISTANT";

/// Message kind markers.
pub const KIND_TEXT: &str = "TEXT";
pub const KIND_ACTION_REQUEST: &str = "ACTION_REQUEST";
pub const KIND_ACTION_RESULT: &str = "ACTION_RESULT";
pub const KIND_SYSTEM: &str = "SYSTEM";

/// A message in a conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct StoredMessage {
    /// Auto-incrementing id; defines append order within a conversation.
    pub id: i64,
    /// Conversation this message belongs to.
    pub conversation_id: String,
    /// Sender role: "USER" or "ASSISTANT".
    pub sender: String,
    /// Body text.
    pub content: String,
    /// Message kind: "TEXT", "ACTION_REQUEST", "ACTION_RESULT", or "SYSTEM".
    pub kind: String,
    /// Optional structured metadata as JSON text.
    pub metadata: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
}

/// Fields for creating a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub tags: Option<String>,
    pub due_date: Option<String>,
    pub ai_generated: bool,
    pub ai_context: Option<String>,
}

/// Partial update for a task. `None` fields keep their stored values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub priority: Option<String>,
    pub tags: Option<String>,
    pub due_date: Option<String>,
    pub ai_context: Option<String>,
}

impl TaskPatch {
    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.completed.is_none()
            && self.priority.is_none()
            && self.tags.is_none()
            && self.due_date.is_none()
            && self.ai_context.is_none()
    }
}

/// Completion status filter for task listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl StatusFilter {
    /// Parse a filter name; unknown values fall back to All.
    pub fn parse(value: &str) -> Self {
        match value {
            "pending" => StatusFilter::Pending,
            "completed" => StatusFilter::Completed,
            _ => StatusFilter::All,
        }
    }
}

/// Filters for task listings.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskFilter {
    pub status: StatusFilter,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
