//! The ChatProvider trait definition.

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::message::{ChatMessage, ChatOutcome, ToolChoice};
use crate::tools::ToolSchema;

/// A chat completion provider.
///
/// Given a message history and a tool catalog, a provider returns either a
/// text reply, a set of requested tool calls, or both. Providers must
/// tolerate being called with an empty tool catalog and must honor
/// [`ToolChoice::None`] by returning no tool calls when the backing API
/// supports it; callers still treat any tool calls returned under
/// `ToolChoice::None` as text-round output.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Run one completion round.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSchema],
        tool_choice: ToolChoice,
    ) -> Result<ChatOutcome, ProviderError>;

    /// Name of this provider, for logging.
    fn name(&self) -> &str;
}
