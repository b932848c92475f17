//! Empty tool host implementation.

use crate::tools::{ToolArguments, ToolDescriptor, ToolError, ToolHost};

/// A tool host with no tools.
///
/// Used when no tool server is configured, and in tests.
#[derive(Debug, Default)]
pub struct EmptyToolHost;

impl ToolHost for EmptyToolHost {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolError> {
        Ok(Vec::new())
    }

    async fn call_tool(&self, name: &str, _arguments: ToolArguments) -> Result<String, ToolError> {
        Err(ToolError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_host_has_no_tools() {
        let host = EmptyToolHost;
        assert!(host.list_tools().await.unwrap().is_empty());
        assert_eq!(
            host.call_tool("add", ToolArguments::new()).await,
            Err(ToolError::NotFound("add".into()))
        );
    }
}
