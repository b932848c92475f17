use super::errors::ModelError;
use crate::tools::{ToolArguments, ToolError};
use serde_json::Value;
use std::future::Future;

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    Tool,
}

/// A tool invocation requested by the model.
///
/// `arguments` is the raw JSON payload exactly as the model produced it.
/// It is only decoded at dispatch time, see [`ToolInvocation::parse_arguments`].
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

impl ToolInvocation {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Decode the argument payload into an argument map.
    ///
    /// A blank payload or a JSON `null` decodes to no arguments. Anything
    /// that is not a JSON object is malformed.
    pub fn parse_arguments(&self) -> Result<ToolArguments, ToolError> {
        if self.arguments.trim().is_empty() {
            return Ok(ToolArguments::new());
        }

        match serde_json::from_str::<Value>(&self.arguments) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(Value::Null) => Ok(ToolArguments::new()),
            Ok(other) => Err(ToolError::MalformedArguments(format!(
                "expected an object, got {other}"
            ))),
            Err(e) => Err(ToolError::MalformedArguments(e.to_string())),
        }
    }
}

/// A message in the conversation history.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Invocations declared by an assistant message.
    pub tool_calls: Vec<ToolInvocation>,
    /// Correlation id of the invocation a tool message answers.
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// An assistant message that declares tool invocations and carries no text.
    pub fn tool_calls(calls: Vec<ToolInvocation>) -> Self {
        Self {
            role: Role::Assistant,
            content: String::new(),
            tool_calls: calls,
            tool_call_id: None,
        }
    }

    /// A tool result bound to the invocation with the given id.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    /// Whether this assistant message declares the invocation `id`.
    pub fn declares(&self, id: &str) -> bool {
        self.role == Role::Assistant && self.tool_calls.iter().any(|call| call.id == id)
    }
}

/// A tool definition in the form the model endpoint expects.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Everything needed for a completion request.
///
/// `tools` is `None` when the tool list is deliberately not sent, which is
/// different from sending an empty list.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub messages: &'a [Message],
    pub tools: Option<&'a [ToolSpec]>,
}

/// One candidate completion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Choice {
    pub content: String,
    pub tool_calls: Vec<ToolInvocation>,
}

impl Choice {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool_calls(calls: Vec<ToolInvocation>) -> Self {
        Self {
            content: String::new(),
            tool_calls: calls,
        }
    }
}

/// The response from a model endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub choices: Vec<Choice>,
    pub usage: Usage,
}

impl Completion {
    pub fn new(choices: Vec<Choice>) -> Self {
        Self {
            choices,
            usage: Usage::default(),
        }
    }
}

/// Trait for model completion backends.
pub trait Backend: Send + Sync {
    fn complete(
        &self,
        request: CompletionRequest<'_>,
    ) -> impl Future<Output = Result<Completion, ModelError>> + Send;
}
