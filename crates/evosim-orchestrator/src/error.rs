//! Error types for evosim-orchestrator.

use thiserror::Error;

use crate::phase::Phase;

/// Result type for evosim-orchestrator operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by a generation transition.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested transition does not start from the current phase.
    #[error("invalid phase: expected {expected}, got {actual}")]
    InvalidPhase {
        expected: &'static str,
        actual: Phase,
    },

    /// Another transition or autoplay owns the machine.
    #[error("a transition is already in flight")]
    Busy,

    /// The engine round-trip failed.
    #[error("engine request failed: {0}")]
    Rpc(#[from] evosim_rpc::Error),

    /// The engine returned a creature set that breaks an invariant.
    #[error("invariant violation: {0}")]
    Invariant(#[from] evosim_stats::Error),

    /// A configuration value could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn phase(expected: &'static str, actual: Phase) -> Self {
        Self::InvalidPhase { expected, actual }
    }
}
