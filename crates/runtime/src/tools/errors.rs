use thiserror::Error;

/// Errors from the tool host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("could not connect to tool server: {0}")]
    Connect(String),
    #[error("tool catalog unavailable: {0}")]
    CatalogUnavailable(String),
    #[error("tool not found: {0}")]
    NotFound(String),
    #[error("malformed tool arguments: {0}")]
    MalformedArguments(String),
    #[error("tool invocation failed: {0}")]
    Invocation(String),
}
