//! The tool catalog advertised to the model.
//!
//! A closed set of operations with declared input schemas. The catalog is
//! static configuration; argument validation happens at execution time
//! because the model's argument JSON is untrusted.

use assistant_core::ToolSchema;
use serde_json::json;

/// The closed set of operations the model may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolName {
    AddTask,
    ListTasks,
    UpdateTask,
    CompleteTask,
    DeleteTask,
    GetAllTasks,
    GetUserIdentity,
}

impl ToolName {
    /// Wire name of the tool.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::AddTask => "add_task",
            ToolName::ListTasks => "list_tasks",
            ToolName::UpdateTask => "update_task",
            ToolName::CompleteTask => "complete_task",
            ToolName::DeleteTask => "delete_task",
            ToolName::GetAllTasks => "get_all_tasks",
            ToolName::GetUserIdentity => "get_user_identity",
        }
    }

    /// Parse a wire name.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "add_task" => Some(ToolName::AddTask),
            "list_tasks" => Some(ToolName::ListTasks),
            "update_task" => Some(ToolName::UpdateTask),
            "complete_task" => Some(ToolName::CompleteTask),
            "delete_task" => Some(ToolName::DeleteTask),
            "get_all_tasks" => Some(ToolName::GetAllTasks),
            "get_user_identity" => Some(ToolName::GetUserIdentity),
            _ => None,
        }
    }

    /// Whether this operation changes task state.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            ToolName::AddTask
                | ToolName::UpdateTask
                | ToolName::CompleteTask
                | ToolName::DeleteTask
        )
    }

    /// Whether this operation only reads task state.
    pub fn is_read_only(&self) -> bool {
        matches!(self, ToolName::ListTasks | ToolName::GetAllTasks)
    }

    /// Whether this operation takes a task identifier that may be positional.
    pub fn takes_task_id(&self) -> bool {
        matches!(
            self,
            ToolName::UpdateTask | ToolName::CompleteTask | ToolName::DeleteTask
        )
    }
}

/// Build the tool schemas handed to the model.
pub fn catalog() -> Vec<ToolSchema> {
    vec![
        ToolSchema::new(
            ToolName::AddTask.as_str(),
            "Add a new task to the user's task list.",
            json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string", "description": "Task title"},
                    "description": {"type": "string", "description": "Longer task description"},
                    "priority": {"type": "string", "enum": ["low", "medium", "high"]},
                    "tags": {"type": "string", "description": "Comma-separated tags"},
                    "due_date": {"type": "string", "description": "Due date, ISO 8601"},
                    "ai_context": {"type": "string", "description": "Why this task was created"}
                },
                "required": ["title"]
            }),
        ),
        ToolSchema::new(
            ToolName::ListTasks.as_str(),
            "List the user's tasks with an optional status filter.",
            json!({
                "type": "object",
                "properties": {
                    "status": {"type": "string", "enum": ["all", "pending", "completed"]},
                    "limit": {"type": "integer", "description": "Maximum number of tasks"},
                    "offset": {"type": "integer", "description": "Number of tasks to skip"}
                }
            }),
        ),
        ToolSchema::new(
            ToolName::UpdateTask.as_str(),
            "Update fields of an existing task. Use the task number the user refers to.",
            json!({
                "type": "object",
                "properties": {
                    "task_id": {"type": "string", "description": "Task id or the number shown in the list"},
                    "title": {"type": "string"},
                    "description": {"type": "string"},
                    "completed": {"type": "boolean"},
                    "priority": {"type": "string", "enum": ["low", "medium", "high"]},
                    "tags": {"type": "string"},
                    "due_date": {"type": "string"},
                    "ai_context": {"type": "string"}
                },
                "required": ["task_id"]
            }),
        ),
        ToolSchema::new(
            ToolName::CompleteTask.as_str(),
            "Mark a task as completed (or incomplete).",
            json!({
                "type": "object",
                "properties": {
                    "task_id": {"type": "string", "description": "Task id or the number shown in the list"},
                    "completed": {"type": "boolean", "description": "Target state, defaults to true"}
                },
                "required": ["task_id"]
            }),
        ),
        ToolSchema::new(
            ToolName::DeleteTask.as_str(),
            "Delete a task from the user's task list.",
            json!({
                "type": "object",
                "properties": {
                    "task_id": {"type": "string", "description": "Task id or the number shown in the list"}
                },
                "required": ["task_id"]
            }),
        ),
        ToolSchema::new(
            ToolName::GetAllTasks.as_str(),
            "Get the user's full task list. Call this before acting on a task number.",
            json!({"type": "object", "properties": {}}),
        ),
        ToolSchema::new(
            ToolName::GetUserIdentity.as_str(),
            "Look up the identity of the current user.",
            json!({"type": "object", "properties": {}}),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_names() {
        for schema in catalog() {
            let parsed = ToolName::parse(&schema.name).unwrap();
            assert_eq!(parsed.as_str(), schema.name);
        }
        assert!(ToolName::parse("unknown_tool").is_none());
    }

    #[test]
    fn test_mutating_classification() {
        assert!(ToolName::AddTask.is_mutating());
        assert!(ToolName::DeleteTask.is_mutating());
        assert!(!ToolName::GetAllTasks.is_mutating());
        assert!(!ToolName::GetUserIdentity.is_mutating());

        assert!(ToolName::ListTasks.is_read_only());
        assert!(ToolName::GetAllTasks.is_read_only());
        assert!(!ToolName::GetUserIdentity.is_read_only());
    }

    #[test]
    fn test_required_fields_declared() {
        let schemas = catalog();
        let add = schemas.iter().find(|s| s.name == "add_task").unwrap();
        assert_eq!(add.parameters["required"][0], "title");

        let delete = schemas.iter().find(|s| s.name == "delete_task").unwrap();
        assert_eq!(delete.parameters["required"][0], "task_id");
    }
}
