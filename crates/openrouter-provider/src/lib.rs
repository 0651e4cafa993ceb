//! OpenRouter-based chat provider implementation.
//!
//! Implements [`assistant_core::ChatProvider`] over the OpenRouter
//! chat-completions HTTP API, including function-calling tools.

mod api_types;
mod config;
mod provider;

pub use config::{OpenRouterConfig, OpenRouterConfigBuilder};
pub use provider::OpenRouterProvider;
