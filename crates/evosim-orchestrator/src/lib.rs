//! Evosim Orchestrator
//!
//! Drives an evolution simulation engine through its generation cycle:
//!
//! ```text
//! Init -> AwaitingStart -> Gen0Review -> ResultsPending -> ResultsReview
//!      -> Sorting -> Sorted -> Culled -> BreedingPending -> BreedingReview
//! ```
//!
//! The [`Orchestrator`] owns the generation history, the current creature set
//! and the generation index. It talks to the engine through an
//! [`evosim_rpc::Multiplexer`], computes a [`GenerationRecord`] for every
//! scoring round and publishes lifecycle events on typed channels
//! ([`EventBus`]).
//!
//! [`AutoplayHandle`] lets a second party stop [`Orchestrator::run_autoplay`]
//! between cycles.
//!
//! [`GenerationRecord`]: evosim_stats::GenerationRecord

pub mod autoplay;
pub mod config;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod phase;
pub mod population;
pub mod preview;
pub mod surface;

#[cfg(test)]
mod testing;

pub use autoplay::AutoplayHandle;
pub use config::OrchestratorConfig;
pub use error::{Error, Result};
pub use events::{
    Event, EventBus, PhaseEntered, PreviewUpdated, SortProgress, StatsReady, Subscriptions,
};
pub use orchestrator::{Orchestrator, Status};
pub use phase::Phase;
pub use population::{creature_info, DisplayCell, Population};
pub use preview::{BodyFactory, Pacing, PreviewSelection, PreviewSession};
pub use surface::{PendingResize, ResizeListener, SurfaceBarrier};
