//! Error types for evosim-stats.

use evosim_protocol::CreatureId;
use thiserror::Error;

/// Result type for evosim-stats operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Invariant violations in an engine-supplied creature set.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The engine returned no creatures.
    #[error("creature set is empty")]
    EmptyPopulation,

    /// A creature in a scored set has no fitness or rank.
    #[error("creature {id} has no score")]
    MissingScore { id: CreatureId },

    /// Ranks are not a permutation of `0..n`.
    #[error("invalid ranks: {0}")]
    InvalidRanks(String),

    /// The population size changed across a transition that preserves it.
    #[error("population size changed: expected {expected}, got {actual}")]
    PopulationSizeChanged { expected: usize, actual: usize },
}
