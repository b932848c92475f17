use crate::model::ModelError;
use thiserror::Error;

/// Errors that end a turn.
///
/// Tool and catalog failures are not here: the turn degrades around them.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QueryError {
    /// The model endpoint failed or did not answer in time.
    #[error("model unavailable: {0}")]
    ModelUnavailable(#[from] ModelError),

    /// The turn deadline passed while a tool was running.
    #[error("tool unavailable: {name} did not answer before the turn deadline")]
    ToolUnavailable { name: String },
}

pub type Result<T> = std::result::Result<T, QueryError>;
