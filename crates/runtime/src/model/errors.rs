use std::time::Duration;
use thiserror::Error;

/// Errors from model endpoint calls.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// The HTTP client could not be constructed.
    #[error("client setup: {0}")]
    Client(String),

    /// A network error occurred during the API call.
    #[error("network: {0}")]
    Network(String),

    /// The endpoint returned an error response.
    #[error("provider api: {0}")]
    Api(String),

    /// The endpoint response could not be parsed.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    /// The turn deadline passed before the endpoint answered.
    #[error("no response within {0:?}")]
    Timeout(Duration),
}
