//! Provider that always fails.

use assistant_core::{
    async_trait, ChatMessage, ChatOutcome, ChatProvider, ProviderError, ToolChoice, ToolSchema,
};

/// A provider that fails every request with a network error.
///
/// Useful for exercising transport-failure paths.
#[derive(Debug, Clone, Default)]
pub struct FailingProvider {
    detail: Option<String>,
}

impl FailingProvider {
    /// Create a provider that fails with a generic message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider that fails with a specific message.
    pub fn with_detail(detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
        }
    }
}

#[async_trait]
impl ChatProvider for FailingProvider {
    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _tools: &[ToolSchema],
        _tool_choice: ToolChoice,
    ) -> Result<ChatOutcome, ProviderError> {
        let detail = self
            .detail
            .clone()
            .unwrap_or_else(|| "simulated outage".to_string());
        Err(ProviderError::Network(detail))
    }

    fn name(&self) -> &str {
        "FailingProvider"
    }
}
