//! CLI error types.

use std::time::Duration;
use thiserror::Error;

use crate::config::ConfigError;

/// CLI errors.
///
/// Errors of a single chat turn are printed by the console and never end up
/// here; these end the process.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration is invalid or missing required settings.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The command needs a tool server but none is configured.
    #[error("no tool server configured: add a [server] section to mcp-chat.toml")]
    NoServer,

    /// The tool server did not finish the handshake in time.
    #[error("tool server did not start within {0:?}")]
    ConnectTimeout(Duration),

    /// The model backend could not be set up.
    #[error(transparent)]
    Model(#[from] runtime::ModelError),

    /// An error occurred talking to the tool server.
    #[error(transparent)]
    Tool(#[from] runtime::ToolError),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
