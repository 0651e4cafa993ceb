//! Agent error types.

use thiserror::Error;

/// Errors surfaced to the chat boundary's caller.
///
/// Tool-level and resolution failures are never errors; they flow back to
/// the model as failed tool results. Only conversation lookup and log
/// persistence can fail a whole turn.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The supplied conversation id is unknown for this owner.
    #[error("conversation not found: {0}")]
    ConversationNotFound(String),

    /// The conversation log could not be read or written.
    #[error(transparent)]
    Store(#[from] task_store::StoreError),
}
