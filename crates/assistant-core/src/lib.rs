//! Core trait and types for chat provider implementations.
//!
//! This crate provides the shared interface between the task assistant's
//! orchestration layer and the LLM providers that drive it. It defines:
//!
//! - [`ChatProvider`] - The trait that all provider implementations must implement
//! - [`ChatMessage`] / [`ChatOutcome`] - Message types for input/output
//! - [`ToolSchema`] / [`ToolCallRequest`] - Tool catalog and tool call types
//! - [`ProviderError`] - Error types for provider operations
//!
//! # Example
//!
//! ```rust
//! use assistant_core::{
//!     ChatMessage, ChatOutcome, ChatProvider, ProviderError, ToolChoice, ToolSchema,
//! };
//! use async_trait::async_trait;
//!
//! struct MyProvider;
//!
//! #[async_trait]
//! impl ChatProvider for MyProvider {
//!     async fn complete(
//!         &self,
//!         _messages: &[ChatMessage],
//!         _tools: &[ToolSchema],
//!         _tool_choice: ToolChoice,
//!     ) -> Result<ChatOutcome, ProviderError> {
//!         Ok(ChatOutcome::text("Hello!"))
//!     }
//!
//!     fn name(&self) -> &str {
//!         "MyProvider"
//!     }
//! }
//! ```

mod error;
mod message;
mod provider;
mod tools;

pub use error::ProviderError;
pub use message::{ChatMessage, ChatOutcome, ChatRole, ToolChoice};
pub use provider::ChatProvider;
pub use tools::{ToolArguments, ToolCallRequest, ToolSchema};

// Re-export async_trait for convenience
pub use async_trait::async_trait;
