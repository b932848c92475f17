//! Model protocol types, the backend trait, and the OpenAI-compatible backend.

pub mod errors;
mod openai;
pub mod types;

pub use errors::ModelError;
pub use openai::{OpenAiBackend, OpenAiBackendBuilder};
pub use types::{
    Backend, Choice, Completion, CompletionRequest, Message, Role, ToolInvocation, ToolSpec, Usage,
};
