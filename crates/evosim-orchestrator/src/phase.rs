//! Generation phases.

use serde::Serialize;

/// Where the generation cycle currently stands.
///
/// ```text
/// Init -> AwaitingStart -> Gen0Review -> ResultsPending -> ResultsReview
///   -> Sorting -> Sorted -> Culled -> BreedingPending -> BreedingReview
///   -> ResultsPending | Watching -> ResultsReview
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Init,
    AwaitingStart,
    Gen0Review,
    ResultsPending,
    ResultsReview,
    Sorting,
    Sorted,
    Culled,
    BreedingPending,
    BreedingReview,
    Watching,
}

impl Phase {
    /// Phases that exist only while an engine call or animation runs.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Sorting | Self::BreedingPending | Self::Watching)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Init => write!(f, "Init"),
            Self::AwaitingStart => write!(f, "AwaitingStart"),
            Self::Gen0Review => write!(f, "Gen0Review"),
            Self::ResultsPending => write!(f, "ResultsPending"),
            Self::ResultsReview => write!(f, "ResultsReview"),
            Self::Sorting => write!(f, "Sorting"),
            Self::Sorted => write!(f, "Sorted"),
            Self::Culled => write!(f, "Culled"),
            Self::BreedingPending => write!(f, "BreedingPending"),
            Self::BreedingReview => write!(f, "BreedingReview"),
            Self::Watching => write!(f, "Watching"),
        }
    }
}
