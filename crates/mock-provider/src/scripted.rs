//! Scripted provider that replays a fixed sequence of outcomes.

use std::collections::VecDeque;

use assistant_core::{
    async_trait, ChatMessage, ChatOutcome, ChatProvider, ProviderError, ToolChoice, ToolSchema,
};
use tokio::sync::Mutex;

/// A snapshot of one request the provider saw, for assertions.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    /// Number of messages in the history.
    pub message_count: usize,
    /// Tool-choice policy of the call.
    pub tool_choice: ToolChoice,
}

/// A provider that replays a scripted sequence of outcomes.
///
/// Each call to [`ChatProvider::complete`] pops the next outcome from the
/// queue and records the request it was given. When the script runs out it
/// answers with a default text reply, so over-long orchestration loops fail
/// assertions rather than panicking.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<ChatOutcome>>,
    seen: Mutex<Vec<SeenRequest>>,
}

impl ScriptedProvider {
    /// Create a provider from a sequence of outcomes.
    pub fn new(outcomes: Vec<ChatOutcome>) -> Self {
        Self {
            script: Mutex::new(outcomes.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// The requests this provider has answered so far.
    pub async fn seen_requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().await.clone()
    }

    /// Number of scripted outcomes not yet consumed.
    pub async fn remaining(&self) -> usize {
        self.script.lock().await.len()
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        _tools: &[ToolSchema],
        tool_choice: ToolChoice,
    ) -> Result<ChatOutcome, ProviderError> {
        self.seen.lock().await.push(SeenRequest {
            message_count: messages.len(),
            tool_choice,
        });

        let next = self.script.lock().await.pop_front();
        Ok(next.unwrap_or_else(|| ChatOutcome::text("(script exhausted)")))
    }

    fn name(&self) -> &str {
        "ScriptedProvider"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assistant_core::ToolCallRequest;

    #[tokio::test]
    async fn test_replays_in_order() {
        let provider = ScriptedProvider::new(vec![
            ChatOutcome::tool_calls(vec![ToolCallRequest::new("c1", "get_all_tasks", "{}")]),
            ChatOutcome::text("done"),
        ]);

        let first = provider.complete(&[], &[], ToolChoice::Auto).await.unwrap();
        assert!(first.has_tool_calls());

        let second = provider.complete(&[], &[], ToolChoice::None).await.unwrap();
        assert_eq!(second.text_or_default(), "done");

        let seen = provider.seen_requests().await;
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].tool_choice, ToolChoice::Auto);
        assert_eq!(seen[1].tool_choice, ToolChoice::None);
    }

    #[tokio::test]
    async fn test_exhausted_script_returns_text() {
        let provider = ScriptedProvider::new(vec![]);
        let outcome = provider.complete(&[], &[], ToolChoice::Auto).await.unwrap();
        assert!(!outcome.has_tool_calls());
        assert!(outcome.text.is_some());
    }
}
