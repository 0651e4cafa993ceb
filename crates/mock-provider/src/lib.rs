//! Mock chat provider implementations for testing.
//!
//! - [`ScriptedProvider`] - hands out a fixed sequence of outcomes
//! - [`FailingProvider`] - always fails with a chosen error

mod failing;
mod scripted;

pub use failing::FailingProvider;
pub use scripted::{ScriptedProvider, SeenRequest};
