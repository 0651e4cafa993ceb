//! The command orchestrator.
//!
//! One [`TaskAgent::handle_message`] call drives a full turn: persist the
//! user message, negotiate up to two tool-bearing rounds with the model,
//! execute requested calls through the runner, then force a final no-tools
//! round and sanitize the text. Whether a mutation happened is taken from
//! the structured invocation records, never from the model's prose.

use std::sync::Arc;

use assistant_core::{ChatMessage, ChatOutcome, ChatProvider, ToolChoice, ToolSchema};
use serde::{Deserialize, Serialize};
use task_store::{conversation, message, models, Conversation, Database, StoreError, StoredMessage};
use tracing::{debug, info, warn};

use crate::catalog;
use crate::error::AgentError;
use crate::resolver::Resolver;
use crate::runner::{ToolInvocation, ToolRunner};
use crate::sanitize;
use crate::store::{SqliteTaskStore, TaskStore, TaskView};

/// Fixed apology returned when the model transport fails.
pub const APOLOGY: &str = "⚠️ AI service is experiencing issues. Please try again.";

/// Maximum number of tool-bearing rounds per user turn.
const MAX_TOOL_ROUNDS: usize = 2;

/// Default system prompt for the task assistant.
const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a helpful task management assistant. You can add, list, update, \
complete, and delete the user's tasks using the available tools. Users refer \
to tasks by the numbers shown in the last list; pass that number as the \
task_id and it will be resolved for you. When you are unsure which task the \
user means, fetch the task list first. Reply with a short, friendly \
confirmation of what you did.";

/// A chat request from the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// The user's message.
    pub message: String,
    /// Conversation to resume; a new one is created when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

impl ChatRequest {
    /// Create a request that starts a new conversation.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            conversation_id: None,
        }
    }

    /// Create a request that resumes a conversation.
    pub fn resume(message: impl Into<String>, conversation_id: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            conversation_id: Some(conversation_id.into()),
        }
    }
}

/// The reply for one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    /// Sanitized user-facing text.
    pub response: String,
    /// The conversation this turn belongs to.
    pub conversation_id: String,
    /// True iff any executed tool call was a mutation that succeeded.
    pub action_performed: bool,
    /// The owner's fresh task list, attached when a mutation happened.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<TaskView>>,
    /// Diagnostic detail when the model transport failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The conversational task assistant.
pub struct TaskAgent {
    provider: Arc<dyn ChatProvider>,
    store: Arc<dyn TaskStore>,
    runner: ToolRunner,
    db: Database,
    tools: Vec<ToolSchema>,
    system_prompt: String,
}

impl TaskAgent {
    /// Create an agent over a provider and a connected database.
    pub fn new(provider: Arc<dyn ChatProvider>, db: Database) -> Self {
        let store: Arc<dyn TaskStore> = Arc::new(SqliteTaskStore::new(db.clone()));
        let resolver = Arc::new(Resolver::new());
        let runner = ToolRunner::new(store.clone(), resolver);

        info!("TaskAgent initialized with provider: {}", provider.name());

        Self {
            provider,
            store,
            runner,
            db,
            tools: catalog::catalog(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }

    /// Replace the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Handle one user turn.
    ///
    /// A supplied but unknown conversation id fails the request; the user
    /// message is persisted before the model is consulted, so a transport
    /// failure never loses the user's intent.
    pub async fn handle_message(
        &self,
        owner: &str,
        request: ChatRequest,
    ) -> Result<ChatReply, AgentError> {
        let conversation = self.resolve_conversation(owner, &request).await?;

        message::append_message(
            self.db.pool(),
            &conversation.id,
            models::SENDER_USER,
            &request.message,
            models::KIND_TEXT,
            None,
        )
        .await?;

        let mut messages = self.build_history(&conversation.id).await?;
        let mut invocations: Vec<ToolInvocation> = Vec::new();
        let mut rounds_used = 0usize;
        let mut allow_tools = true;

        let raw_text = loop {
            let tool_choice = if allow_tools {
                ToolChoice::Auto
            } else {
                ToolChoice::None
            };

            let outcome = match self
                .provider
                .complete(&messages, &self.tools, tool_choice)
                .await
            {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("Model transport failure for owner {}: {}", owner, e);
                    return Ok(ChatReply {
                        response: APOLOGY.to_string(),
                        conversation_id: conversation.id,
                        action_performed: false,
                        tasks: None,
                        error: Some(e.to_string()),
                    });
                }
            };

            // A text-only reply, or anything produced with tools disabled,
            // is the final text
            if tool_choice == ToolChoice::None || !outcome.has_tool_calls() {
                break outcome.text_or_default();
            }

            rounds_used += 1;
            debug!(
                "Round {}: model requested {} tool calls",
                rounds_used,
                outcome.tool_calls.len()
            );

            let round_read_only = self
                .execute_round(owner, &conversation.id, &outcome, &mut messages, &mut invocations)
                .await?;

            // A follow-up tool round is granted only after a pure
            // look-before-you-act round, within the round budget
            allow_tools = round_read_only && rounds_used < MAX_TOOL_ROUNDS;
        };

        let action_performed = invocations.iter().any(ToolInvocation::performed_mutation);
        let needs_task_list = action_performed
            || invocations.iter().any(|inv| inv.resolution_failure);
        let current_tasks = if needs_task_list {
            self.store.fetch_all(owner).await.ok()
        } else {
            None
        };

        let response =
            sanitize::finalize_reply(&raw_text, &invocations, current_tasks.as_deref());

        message::append_message(
            self.db.pool(),
            &conversation.id,
            models::SENDER_ASSISTANT,
            &response,
            models::KIND_TEXT,
            None,
        )
        .await?;

        Ok(ChatReply {
            response,
            conversation_id: conversation.id,
            action_performed,
            tasks: if action_performed { current_tasks } else { None },
            error: None,
        })
    }

    /// List the owner's active conversations.
    pub async fn list_conversations(
        &self,
        owner: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Conversation>, AgentError> {
        Ok(conversation::list_conversations(self.db.pool(), owner, limit, offset).await?)
    }

    /// Read a conversation's messages in append order.
    pub async fn conversation_messages(
        &self,
        owner: &str,
        conversation_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<StoredMessage>, AgentError> {
        // Ownership check before reading the log
        self.lookup_conversation(owner, conversation_id).await?;
        Ok(message::list_messages(self.db.pool(), conversation_id, limit, offset).await?)
    }

    /// Soft-delete a conversation.
    pub async fn deactivate_conversation(
        &self,
        owner: &str,
        conversation_id: &str,
    ) -> Result<(), AgentError> {
        match conversation::deactivate_conversation(self.db.pool(), owner, conversation_id).await {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound { .. }) => {
                Err(AgentError::ConversationNotFound(conversation_id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn resolve_conversation(
        &self,
        owner: &str,
        request: &ChatRequest,
    ) -> Result<Conversation, AgentError> {
        match request.conversation_id.as_deref() {
            Some(id) => self.lookup_conversation(owner, id).await,
            None => {
                let title = chrono::Local::now()
                    .format("AI Chat - %Y-%m-%d %H:%M")
                    .to_string();
                Ok(conversation::create_conversation(self.db.pool(), owner, &title).await?)
            }
        }
    }

    async fn lookup_conversation(
        &self,
        owner: &str,
        id: &str,
    ) -> Result<Conversation, AgentError> {
        match conversation::get_conversation(self.db.pool(), owner, id).await {
            Ok(found) => Ok(found),
            Err(StoreError::NotFound { .. }) => {
                Err(AgentError::ConversationNotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Build the model history: system prompt plus the conversation's text
    /// turns, including the just-persisted user message.
    async fn build_history(&self, conversation_id: &str) -> Result<Vec<ChatMessage>, AgentError> {
        let mut history = vec![ChatMessage::system(self.system_prompt.clone())];

        let stored = message::list_messages(self.db.pool(), conversation_id, -1, 0).await?;
        for entry in stored {
            if entry.kind != models::KIND_TEXT {
                continue;
            }
            match entry.sender.as_str() {
                models::SENDER_USER => history.push(ChatMessage::user(entry.content)),
                models::SENDER_ASSISTANT => history.push(ChatMessage::assistant(entry.content)),
                _ => {}
            }
        }

        Ok(history)
    }

    /// Execute every call of one round, in the order the model returned
    /// them. Returns whether the round consisted solely of successful
    /// read-only calls.
    async fn execute_round(
        &self,
        owner: &str,
        conversation_id: &str,
        outcome: &ChatOutcome,
        messages: &mut Vec<ChatMessage>,
        invocations: &mut Vec<ToolInvocation>,
    ) -> Result<bool, AgentError> {
        messages.push(ChatMessage::assistant_tool_calls(outcome.tool_calls.clone()));
        message::append_message(
            self.db.pool(),
            conversation_id,
            models::SENDER_ASSISTANT,
            &serde_json::to_string(&outcome.tool_calls).unwrap_or_default(),
            models::KIND_ACTION_REQUEST,
            None,
        )
        .await?;

        let mut round_read_only = true;

        for call in &outcome.tool_calls {
            let records = self.runner.run(owner, call).await;
            for record in records {
                if !record.synthetic {
                    let read_only = record
                        .tool_name()
                        .map(|t| t.is_read_only())
                        .unwrap_or(false);
                    if !read_only || !record.result.success {
                        round_read_only = false;
                    }
                }

                let content =
                    serde_json::to_string(&record.result).unwrap_or_else(|_| "{}".to_string());
                let metadata = format!(r#"{{"tool":"{}"}}"#, record.tool);
                messages.push(ChatMessage::tool_result(&record.call_id, &content));
                message::append_message(
                    self.db.pool(),
                    conversation_id,
                    models::SENDER_ASSISTANT,
                    &content,
                    models::KIND_ACTION_RESULT,
                    Some(&metadata),
                )
                .await?;

                invocations.push(record);
            }
        }

        Ok(round_read_only)
    }
}
