//! Tool schema and tool call types.
//!
//! The orchestration layer advertises a catalog of [`ToolSchema`] entries to
//! the model; the model answers with [`ToolCallRequest`] entries whose
//! arguments arrive as a raw JSON string and may be malformed. Argument
//! parsing is therefore deferred to the executor, which treats a parse
//! failure as a per-call failure.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A tool advertised to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Tool name as the model must request it.
    pub name: String,
    /// Human-readable description shown to the model.
    pub description: String,
    /// JSON Schema object describing the parameters.
    pub parameters: Value,
}

impl ToolSchema {
    /// Create a new tool schema.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A tool call requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Unique id for this call, assigned by the provider.
    pub id: String,
    /// Name of the tool to execute.
    pub name: String,
    /// Raw argument JSON exactly as the model produced it.
    pub arguments: String,
}

impl ToolCallRequest {
    /// Create a new tool call request.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Parse the raw argument JSON into a map.
    ///
    /// The model may emit malformed JSON; callers must treat an error here
    /// as a failure of this single call only.
    pub fn parse_arguments(&self) -> Result<HashMap<String, Value>, serde_json::Error> {
        serde_json::from_str(&self.arguments)
    }
}

/// Parsed tool arguments with typed accessors.
#[derive(Debug, Clone, Default)]
pub struct ToolArguments {
    values: HashMap<String, Value>,
}

impl ToolArguments {
    /// Wrap an already-parsed argument map.
    pub fn new(values: HashMap<String, Value>) -> Self {
        Self { values }
    }

    /// Get a string argument by name.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(|v| v.as_str())
    }

    /// Get a required string argument, or return an error message.
    pub fn require_str(&self, key: &str) -> Result<&str, String> {
        self.get_str(key)
            .ok_or_else(|| format!("Missing required argument: {}", key))
    }

    /// Get a boolean argument by name.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.get(key).and_then(|v| v.as_bool())
    }

    /// Get an integer argument by name.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.values.get(key).and_then(|v| v.as_i64())
    }

    /// Whether an argument is present (regardless of type).
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Names of all supplied arguments.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    /// Raw value access.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arguments() {
        let call = ToolCallRequest::new(
            "call-1",
            "add_task",
            r#"{"title": "Buy milk", "priority": "high"}"#,
        );
        let args = ToolArguments::new(call.parse_arguments().unwrap());

        assert_eq!(args.get_str("title"), Some("Buy milk"));
        assert_eq!(args.get_str("priority"), Some("high"));
        assert!(args.get_str("missing").is_none());
    }

    #[test]
    fn test_parse_malformed_arguments() {
        let call = ToolCallRequest::new("call-2", "add_task", "{not json");
        assert!(call.parse_arguments().is_err());
    }

    #[test]
    fn test_require_str_missing() {
        let call = ToolCallRequest::new("call-3", "delete_task", r#"{"foo": "bar"}"#);
        let args = ToolArguments::new(call.parse_arguments().unwrap());

        let err = args.require_str("task_id").unwrap_err();
        assert!(err.contains("task_id"));
    }

    #[test]
    fn test_typed_getters() {
        let call = ToolCallRequest::new(
            "call-4",
            "complete_task",
            r#"{"task_id": "abc", "completed": false, "limit": 5}"#,
        );
        let args = ToolArguments::new(call.parse_arguments().unwrap());

        assert_eq!(args.get_bool("completed"), Some(false));
        assert_eq!(args.get_i64("limit"), Some(5));
        assert!(args.contains("task_id"));
        assert!(!args.contains("offset"));
    }
}
