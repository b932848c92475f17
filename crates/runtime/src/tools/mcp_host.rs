//! MCP-backed tool host.
//!
//! Spawns an MCP server as a child process and talks to it over stdio using
//! the official rmcp SDK.
//!
//! # Example
//!
//! ```ignore
//! use runtime::{McpServerConfig, McpToolHost, ToolHost};
//!
//! # async fn example() -> Result<(), runtime::ToolError> {
//! let config = McpServerConfig::new("bin/calculator-server");
//! let host = McpToolHost::connect(&config).await?;
//!
//! for tool in host.list_tools().await? {
//!     println!("Tool: {}", tool.name);
//! }
//! host.shutdown().await
//! # }
//! ```

use std::collections::HashMap;

use rmcp::{
    ServiceExt,
    model::{CallToolRequestParams, CallToolResult, Tool},
    service::{RoleClient, RunningService},
    transport::{ConfigureCommandExt, TokioChildProcess},
};
use serde::Deserialize;
use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, info};

use super::{ToolArguments, ToolDescriptor, ToolError, ToolHost};

/// How to launch an MCP server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct McpServerConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl McpServerConfig {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            env: HashMap::new(),
        }
    }
}

/// Identity the server reported during the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

/// Tool host backed by an MCP server.
pub struct McpToolHost {
    service: RunningService<RoleClient, ()>,
    server_info: Option<ServerInfo>,
}

impl McpToolHost {
    /// Spawn the server process and perform the MCP handshake.
    pub async fn connect(config: &McpServerConfig) -> Result<Self, ToolError> {
        let command = Command::new(&config.command).configure(|cmd| {
            cmd.args(&config.args).envs(&config.env);
        });
        let transport = TokioChildProcess::new(command)
            .map_err(|e| ToolError::Connect(format!("spawn {}: {e}", config.command)))?;

        let service = ()
            .serve(transport)
            .await
            .map_err(|e| ToolError::Connect(e.to_string()))?;

        let server_info = service.peer_info().map(|info| ServerInfo {
            name: info.server_info.name.clone(),
            version: info.server_info.version.clone(),
        });

        info!(
            command = %config.command,
            server = server_info.as_ref().map_or("unknown", |s| s.name.as_str()),
            "connected to MCP server"
        );

        Ok(Self {
            service,
            server_info,
        })
    }

    /// Server identity, if the server reported one.
    pub fn server_info(&self) -> Option<&ServerInfo> {
        self.server_info.as_ref()
    }

    /// Shutdown the client and terminate the server process.
    pub async fn shutdown(self) -> Result<(), ToolError> {
        self.service
            .cancel()
            .await
            .map(|_| ())
            .map_err(|e| ToolError::Connect(format!("shutdown: {e}")))
    }
}

impl ToolHost for McpToolHost {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolError> {
        let response = self
            .service
            .list_tools(Default::default())
            .await
            .map_err(|e| ToolError::CatalogUnavailable(e.to_string()))?;

        let tools = response.tools.into_iter().map(ToolDescriptor::from);
        Ok(tools.collect())
    }

    async fn call_tool(&self, name: &str, arguments: ToolArguments) -> Result<String, ToolError> {
        let params = CallToolRequestParams {
            name: name.to_string().into(),
            arguments: Some(arguments),
            meta: None,
            task: None,
        };

        let result = self
            .service
            .call_tool(params)
            .await
            .map_err(|e| ToolError::Invocation(format!("{name}: {e}")))?;

        let text = tool_output(name, &result)?;
        debug!(tool = name, bytes = text.len(), "tool returned");
        Ok(text)
    }
}

/// The text of a tool result, or an invocation error if the server flagged it.
fn tool_output(name: &str, result: &CallToolResult) -> Result<String, ToolError> {
    let text = render_content(result);
    if result.is_error.unwrap_or(false) {
        return Err(ToolError::Invocation(format!("{name}: {text}")));
    }
    Ok(text)
}

impl From<Tool> for ToolDescriptor {
    fn from(tool: Tool) -> Self {
        Self {
            name: tool.name.to_string(),
            description: tool.description.map(|d| d.to_string()).unwrap_or_default(),
            parameters: Value::Object(tool.input_schema.as_ref().clone()),
        }
    }
}

/// Flatten a tool result into text: text items verbatim, anything else as JSON.
fn render_content(result: &CallToolResult) -> String {
    result
        .content
        .iter()
        .map(|item| match item.as_text() {
            Some(text) => text.text.clone(),
            None => serde_json::to_string(item).unwrap_or_default(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::Content;
    use serde_json::json;

    #[tokio::test]
    async fn connect_reports_missing_command() {
        let config = McpServerConfig::new("/nonexistent/mcp-server-for-tests");
        let err = McpToolHost::connect(&config).await.err().unwrap();
        assert!(matches!(err, ToolError::Connect(_)));
    }

    #[test]
    fn server_config_defaults() {
        let config: McpServerConfig =
            serde_json::from_value(serde_json::json!({"command": "calc"})).unwrap();
        assert_eq!(config, McpServerConfig::new("calc"));
    }

    #[test]
    fn text_items_are_joined_with_newlines() {
        let result = CallToolResult::success(vec![Content::text("5"), Content::text("done")]);
        assert_eq!(tool_output("add", &result).unwrap(), "5\ndone");
    }

    #[test]
    fn non_text_items_are_rendered_as_json() {
        let result = CallToolResult::success(vec![
            Content::text("chart:"),
            Content::image("aGk=", "image/png"),
        ]);
        let output = tool_output("plot", &result).unwrap();

        let (text, image) = output.split_once('\n').unwrap();
        assert_eq!(text, "chart:");
        let image: Value = serde_json::from_str(image).unwrap();
        assert_eq!(
            image,
            json!({"type": "image", "data": "aGk=", "mimeType": "image/png"})
        );
    }

    #[test]
    fn error_result_is_invocation_error() {
        let result = CallToolResult::error(vec![Content::text("division by zero")]);
        assert_eq!(
            tool_output("div", &result),
            Err(ToolError::Invocation("div: division by zero".into()))
        );
    }

    #[test]
    fn empty_result_is_empty_text() {
        let result = CallToolResult::success(Vec::new());
        assert_eq!(tool_output("noop", &result).unwrap(), "");
    }
}
