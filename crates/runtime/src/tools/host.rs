//! Tool host trait.

use crate::tools::ToolError;
use serde_json::{Map, Value};
use std::future::Future;

/// Decoded arguments of a tool invocation.
pub type ToolArguments = Map<String, Value>;

/// A tool as advertised by the tool host.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Trait for tool execution hosts.
///
/// This is the boundary between the turn loop and side effects. The catalog
/// is queried fresh on every turn, so implementations should not cache it.
pub trait ToolHost: Send + Sync {
    /// List the tools currently available.
    fn list_tools(&self) -> impl Future<Output = Result<Vec<ToolDescriptor>, ToolError>> + Send;

    /// Invoke a tool by name and return its text output.
    fn call_tool(
        &self,
        name: &str,
        arguments: ToolArguments,
    ) -> impl Future<Output = Result<String, ToolError>> + Send;
}
