//! Turn orchestration.
//!
//! One turn runs the cycle: fetch the tool catalog, append the user message,
//! ask the model, and if it requested tools, dispatch them, append the
//! declaration and the results, then ask the model once more. Only one tool
//! round is performed per choice.
//!
//! Failures are split in two groups. Catalog failures, tool failures and
//! undecodable tool arguments degrade the turn. Model failures and an expired
//! turn deadline end it with a [`QueryError`]. Messages appended before the
//! failure stay in the history.

use std::time::Duration;

use serde::Deserialize;
use tokio::time::{Instant, timeout_at};
use tracing::{Instrument, debug, info_span, warn};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::history::ConversationHistory;
use crate::model::{
    Backend, Completion, CompletionRequest, Message, ModelError, ToolInvocation, ToolSpec,
};
use crate::tools::{ToolArguments, ToolHost};
use crate::{QueryError, Result};

/// Default wall-clock budget for one turn.
pub const DEFAULT_TURN_TIMEOUT: Duration = Duration::from_secs(60);

/// Deadline used when the turn budget does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// What to record in the history when a tool call fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailedToolPolicy {
    /// Record nothing. The declared call is left without a result.
    #[default]
    Omit,
    /// Record a tool message with the error text so the model sees it.
    Report,
}

/// Per-turn settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnConfig {
    pub turn_timeout: Duration,
    /// Send at most this many trailing messages to the model.
    pub history_window: Option<usize>,
    pub failed_tools: FailedToolPolicy,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            turn_timeout: DEFAULT_TURN_TIMEOUT,
            history_window: None,
            failed_tools: FailedToolPolicy::Omit,
        }
    }
}

/// Drives a single conversation between a model backend and a tool host.
pub struct Orchestrator<B, H> {
    session_id: Uuid,
    backend: B,
    tools: H,
    history: ConversationHistory,
    config: TurnConfig,
    turns: u64,
}

impl<B: Backend, H: ToolHost> Orchestrator<B, H> {
    pub fn new(backend: B, tools: H) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            backend,
            tools,
            history: ConversationHistory::new(),
            config: TurnConfig::default(),
            turns: 0,
        }
    }

    pub fn with_config(mut self, config: TurnConfig) -> Self {
        self.config = config;
        self
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn tools(&self) -> &H {
        &self.tools
    }

    /// Give back the tool host, e.g. to shut it down.
    pub fn into_tools(self) -> H {
        self.tools
    }

    /// Run one turn for `user_text` and return the final answer.
    ///
    /// Answer fragments from every choice are joined with newlines. A turn
    /// that produced no text returns an empty string.
    pub async fn process_query(&mut self, user_text: &str) -> Result<String> {
        self.turns += 1;
        let span = info_span!("turn", session = %self.session_id, turn = self.turns);
        self.run_turn(user_text).instrument(span).await
    }

    async fn run_turn(&mut self, user_text: &str) -> Result<String> {
        let now = Instant::now();
        let deadline = now
            .checked_add(self.config.turn_timeout)
            .unwrap_or(now + FAR_FUTURE);

        let catalog = self.fetch_catalog(deadline).await;
        let specs = catalog.specs();

        self.history.push(Message::user(user_text));

        let first = self.complete(Some(specs.as_slice()), deadline).await?;
        let mut fragments = Vec::new();

        for choice in first.choices {
            if !choice.content.is_empty() {
                fragments.push(choice.content);
                continue;
            }
            if choice.tool_calls.is_empty() {
                continue;
            }

            let results = self.dispatch(&choice.tool_calls, deadline).await?;

            // Declaration and results land together, after every call finished.
            self.history.push(Message::tool_calls(choice.tool_calls));
            self.history.extend(results);

            let follow_up = self.complete(None, deadline).await?;
            fragments.extend(
                follow_up
                    .choices
                    .into_iter()
                    .map(|choice| choice.content)
                    .filter(|content| !content.is_empty()),
            );
        }

        debug!(
            fragments = fragments.len(),
            history = self.history.len(),
            "turn finished"
        );
        Ok(fragments.join("\n"))
    }

    async fn fetch_catalog(&self, deadline: Instant) -> Catalog {
        match timeout_at(deadline, Catalog::fetch(&self.tools)).await {
            Ok(Ok(catalog)) => {
                debug!(tools = catalog.len(), "tool catalog fetched");
                catalog
            }
            Ok(Err(e)) => {
                warn!(error = %e, "continuing without tools");
                Catalog::empty()
            }
            Err(_) => {
                warn!("tool catalog timed out, continuing without tools");
                Catalog::empty()
            }
        }
    }

    async fn complete(&self, tools: Option<&[ToolSpec]>, deadline: Instant) -> Result<Completion> {
        let request = CompletionRequest {
            messages: self.history.window(self.config.history_window),
            tools,
        };

        match timeout_at(deadline, self.backend.complete(request)).await {
            Ok(completion) => Ok(completion?),
            Err(_) => Err(ModelError::Timeout(self.config.turn_timeout).into()),
        }
    }

    /// Run each call in order and collect the tool messages to append.
    async fn dispatch(&self, calls: &[ToolInvocation], deadline: Instant) -> Result<Vec<Message>> {
        let mut results = Vec::with_capacity(calls.len());

        for call in calls {
            let arguments = call.parse_arguments().unwrap_or_else(|e| {
                warn!(tool = %call.name, id = %call.id, error = %e, "calling tool without arguments");
                ToolArguments::new()
            });

            debug!(tool = %call.name, id = %call.id, "calling tool");
            match timeout_at(deadline, self.tools.call_tool(&call.name, arguments)).await {
                Ok(Ok(output)) => results.push(Message::tool_result(&call.id, output)),
                Ok(Err(e)) => {
                    warn!(tool = %call.name, id = %call.id, error = %e, "tool call failed");
                    if self.config.failed_tools == FailedToolPolicy::Report {
                        results.push(Message::tool_result(&call.id, format!("error: {e}")));
                    }
                }
                Err(_) => {
                    return Err(QueryError::ToolUnavailable {
                        name: call.name.clone(),
                    });
                }
            }
        }

        Ok(results)
    }
}
