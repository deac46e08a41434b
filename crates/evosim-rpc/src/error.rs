//! Error types for evosim-rpc.

use std::time::Duration;

use evosim_protocol::CommandTag;
use thiserror::Error;

/// Result type for evosim-rpc operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the engine.
#[derive(Debug, Error)]
pub enum Error {
    /// The engine could not be reached, or its link closed while waiting.
    #[error("engine unavailable: {0}")]
    EngineUnavailable(String),

    /// No response within the configured request timeout.
    #[error("engine did not respond within {0:?}")]
    Timeout(Duration),

    /// A response arrived but lacked the payload the caller needs.
    #[error("unexpected payload for {tag}: {reason}")]
    UnexpectedPayload { tag: CommandTag, reason: String },

    /// Spawning or talking to an engine process failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
