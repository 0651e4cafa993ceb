//! Conversational task assistant built on tool-calling chat models.
//!
//! The crate turns a chat message into task-store operations and a clean
//! text reply. [`TaskAgent`] orchestrates the model rounds, the
//! [`ToolRunner`] executes requested calls, the [`Resolver`] maps the task
//! numbers users type to durable task ids, and the sanitizer guarantees the
//! final text is presentable even when the model's own prose is not.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use openrouter_provider::OpenRouterProvider;
//! use task_agent::{ChatRequest, TaskAgent};
//! use task_store::Database;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("sqlite:tasks.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let provider = Arc::new(OpenRouterProvider::from_env()?);
//!     let agent = TaskAgent::new(provider, db);
//!
//!     let owner = "user-1";
//!     let reply = agent
//!         .handle_message(owner, ChatRequest::new("add a task to buy milk"))
//!         .await?;
//!     println!("{}", reply.response);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod catalog;
pub mod error;
pub mod resolver;
pub mod runner;
pub mod sanitize;
pub mod store;

pub use agent::{ChatReply, ChatRequest, TaskAgent, APOLOGY};
pub use catalog::{catalog, ToolName};
pub use error::AgentError;
pub use resolver::{PositionCache, Resolution, Resolver, FRESHNESS_WINDOW};
pub use runner::{ToolInvocation, ToolRunner};
pub use sanitize::{fallback_reply, finalize_reply, render_task_list, sanitize};
pub use store::{SqliteTaskStore, StoreOutcome, TaskStore, TaskView};
