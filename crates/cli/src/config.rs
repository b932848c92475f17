//! Configuration loading from mcp-chat.toml and the environment.

use runtime::{FailedToolPolicy, McpServerConfig, OpenAiBackendBuilder, TurnConfig};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Config file looked up in the working directory when none is given.
pub const CONFIG_FILE: &str = "mcp-chat.toml";

const ENV_API_KEY: &str = "OPENAI_API_KEY";
const ENV_API_BASE: &str = "OPENAI_API_BASE";
const ENV_MODEL: &str = "OPENAI_API_MODEL";

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Model endpoint settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// MCP server to launch. Without one the session has no tools.
    pub server: Option<McpServerConfig>,

    /// Turn and connection limits.
    #[serde(default)]
    pub session: SessionConfig,
}

/// Model endpoint configuration.
#[derive(Debug, Default, Deserialize)]
pub struct ModelConfig {
    /// API key. Overridden by `OPENAI_API_KEY`.
    pub api_key: Option<String>,

    /// API base URL. Overridden by `OPENAI_API_BASE`.
    pub api_base: Option<String>,

    /// Model name. Overridden by `OPENAI_API_MODEL`.
    pub model: Option<String>,

    pub max_tokens: Option<u32>,

    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SessionConfig {
    pub turn_timeout_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    pub history_window: Option<usize>,
    #[serde(default)]
    pub failed_tools: FailedToolPolicy,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load the given file, or [`CONFIG_FILE`] if it exists, or defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load(path),
            None if Path::new(CONFIG_FILE).exists() => Self::load(CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    /// Let environment variables override the model settings.
    ///
    /// Empty values count as unset.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(key) = get(ENV_API_KEY) {
            self.model.api_key = Some(key);
        }
        if let Some(base) = get(ENV_API_BASE) {
            self.model.api_base = Some(base);
        }
        if let Some(model) = get(ENV_MODEL) {
            self.model.model = Some(model);
        }
    }

    /// Build the backend settings.
    ///
    /// Requires an API key and a model name.
    pub fn backend_builder(&self) -> Result<OpenAiBackendBuilder, ConfigError> {
        let api_key = self.model.api_key.as_deref().ok_or(ConfigError::Missing {
            setting: "model.api_key",
            env: ENV_API_KEY,
        })?;
        let model = self.model.model.as_deref().ok_or(ConfigError::Missing {
            setting: "model.model",
            env: ENV_MODEL,
        })?;

        let request_timeout = Duration::from_secs(
            self.model
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        );

        let mut builder = OpenAiBackendBuilder::new(api_key, model)
            .request_timeout(request_timeout);
        if let Some(base) = &self.model.api_base {
            builder = builder.api_base(base);
        }
        if let Some(max_tokens) = self.model.max_tokens {
            builder = builder.max_tokens(max_tokens);
        }
        Ok(builder)
    }

    pub fn turn_config(&self) -> TurnConfig {
        let defaults = TurnConfig::default();
        TurnConfig {
            turn_timeout: self
                .session
                .turn_timeout_secs
                .map_or(defaults.turn_timeout, Duration::from_secs),
            history_window: self.session.history_window,
            failed_tools: self.session.failed_tools,
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(
            self.session
                .connect_timeout_secs
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("{setting} is not configured: set it in mcp-chat.toml or export {env}")]
    Missing {
        setting: &'static str,
        env: &'static str,
    },
}
