//! Tool host boundary and its implementations.

mod empty;
pub mod errors;
mod host;
mod mcp_host;

pub use empty::EmptyToolHost;
pub use errors::ToolError;
pub use host::{ToolArguments, ToolDescriptor, ToolHost};
pub use mcp_host::{McpServerConfig, McpToolHost, ServerInfo};
