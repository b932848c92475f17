//! Tool-calling chat runtime.
//!
//! This crate mediates between a chat completion endpoint and a set of tools
//! exposed by an MCP server. It keeps the conversation history and runs the
//! per-turn cycle of asking the model, dispatching the tools it requests and
//! asking again with their results.
//!
//! # Overview
//!
//! - **Orchestrator**: owns the conversation and runs one turn per query.
//! - **Backend**: a trait abstracting the model endpoint
//!   ([`OpenAiBackend`] for OpenAI-compatible APIs).
//! - **ToolHost**: a trait abstracting the tool server
//!   ([`McpToolHost`] for MCP over stdio, [`EmptyToolHost`] for none).
//! - **Catalog**: the per-turn snapshot of tools, converted for the model.
//!
//! # Example
//!
//! ```ignore
//! use runtime::{McpServerConfig, McpToolHost, OpenAiBackend, Orchestrator};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = OpenAiBackend::builder("sk-...", "gpt-4o-mini").build()?;
//! let tools = McpToolHost::connect(&McpServerConfig::new("bin/calculator-server")).await?;
//!
//! let mut orchestrator = Orchestrator::new(backend, tools);
//! let answer = orchestrator.process_query("what is 2+3?").await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

mod catalog;
mod error;
mod history;
pub mod model;
mod orchestrator;
pub mod tools;

pub use catalog::Catalog;
pub use error::{QueryError, Result};
pub use history::ConversationHistory;
pub use model::{
    Backend, Choice, Completion, CompletionRequest, Message, ModelError, OpenAiBackend,
    OpenAiBackendBuilder, Role, ToolInvocation, ToolSpec, Usage,
};
pub use orchestrator::{DEFAULT_TURN_TIMEOUT, FailedToolPolicy, Orchestrator, TurnConfig};
pub use tools::{
    EmptyToolHost, McpServerConfig, McpToolHost, ServerInfo, ToolArguments, ToolDescriptor,
    ToolError, ToolHost,
};
