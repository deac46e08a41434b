//! Typed lifecycle event channels.
//!
//! Each named event has its own broadcast channel. Consumers subscribe to
//! the ones they care about, or to all of them through [`Subscriptions`].

use std::sync::Arc;

use evosim_anim::{GridPoint, SortStep, WatchStatus};
use evosim_protocol::CreatureId;
use evosim_stats::GenerationRecord;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{trace, warn};

use crate::phase::Phase;

const CHANNEL_CAPACITY: usize = 256;

/// The machine entered a new phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhaseEntered {
    pub phase: Phase,
    pub generation: usize,
}

/// A scoring round finished and its record joined the history.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReady {
    pub record: Arc<GenerationRecord>,
}

/// One frame of the sort transition.
#[derive(Debug, Clone, Serialize)]
pub struct SortProgress {
    #[serde(flatten)]
    pub step: SortStep,
    pub positions: Arc<Vec<(CreatureId, GridPoint)>>,
}

/// Camera and playback state for the followed creature.
///
/// `creature` is `None` once the preview is cleared.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewUpdated {
    pub creature: Option<CreatureId>,
    pub camera_offset: f64,
    pub position_x: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watch: Option<WatchStatus>,
}

impl PreviewUpdated {
    pub fn cleared() -> Self {
        Self {
            creature: None,
            camera_offset: 0.0,
            position_x: 0.0,
            watch: None,
        }
    }
}

/// Any lifecycle event, tagged by name for the presentation layer.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    PhaseEntered(PhaseEntered),
    StatsReady(StatsReady),
    SortProgress(SortProgress),
    PreviewUpdated(PreviewUpdated),
}

/// Sending half of the event channels.
#[derive(Debug, Clone)]
pub struct EventBus {
    phase: broadcast::Sender<PhaseEntered>,
    stats: broadcast::Sender<StatsReady>,
    sort: broadcast::Sender<SortProgress>,
    preview: broadcast::Sender<PreviewUpdated>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            phase: broadcast::channel(CHANNEL_CAPACITY).0,
            stats: broadcast::channel(CHANNEL_CAPACITY).0,
            sort: broadcast::channel(CHANNEL_CAPACITY).0,
            preview: broadcast::channel(CHANNEL_CAPACITY).0,
        }
    }

    // Sends fail only when nobody is listening, which is fine.

    pub fn phase_entered(&self, event: PhaseEntered) {
        trace!(phase = %event.phase, "phase_entered");
        let _ = self.phase.send(event);
    }

    pub fn stats_ready(&self, event: StatsReady) {
        let _ = self.stats.send(event);
    }

    pub fn sort_progress(&self, event: SortProgress) {
        let _ = self.sort.send(event);
    }

    pub fn preview_updated(&self, event: PreviewUpdated) {
        let _ = self.preview.send(event);
    }

    pub fn subscribe_phase(&self) -> broadcast::Receiver<PhaseEntered> {
        self.phase.subscribe()
    }

    pub fn subscribe_stats(&self) -> broadcast::Receiver<StatsReady> {
        self.stats.subscribe()
    }

    pub fn subscribe_sort(&self) -> broadcast::Receiver<SortProgress> {
        self.sort.subscribe()
    }

    pub fn subscribe_preview(&self) -> broadcast::Receiver<PreviewUpdated> {
        self.preview.subscribe()
    }

    /// Subscribe to every channel at once.
    pub fn subscribe(&self) -> Subscriptions {
        Subscriptions {
            phase: self.subscribe_phase(),
            stats: self.subscribe_stats(),
            sort: self.subscribe_sort(),
            preview: self.subscribe_preview(),
        }
    }
}

/// Receiving half of all four channels.
#[derive(Debug)]
pub struct Subscriptions {
    pub phase: broadcast::Receiver<PhaseEntered>,
    pub stats: broadcast::Receiver<StatsReady>,
    pub sort: broadcast::Receiver<SortProgress>,
    pub preview: broadcast::Receiver<PreviewUpdated>,
}

impl Subscriptions {
    /// Next event from any channel.
    ///
    /// A lagging receiver skips what it missed. Returns `None` once the bus
    /// is gone.
    pub async fn next(&mut self) -> Option<Event> {
        loop {
            let received = tokio::select! {
                r = self.phase.recv() => r.map(Event::PhaseEntered),
                r = self.stats.recv() => r.map(Event::StatsReady),
                r = self.sort.recv() => r.map(Event::SortProgress),
                r = self.preview.recv() => r.map(Event::PreviewUpdated),
            };
            match received {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn typed_channels_are_independent() {
        let bus = EventBus::new();
        let mut phases = bus.subscribe_phase();
        let mut previews = bus.subscribe_preview();

        bus.phase_entered(PhaseEntered {
            phase: Phase::AwaitingStart,
            generation: 0,
        });

        assert_eq!(phases.recv().await.unwrap().phase, Phase::AwaitingStart);
        assert!(previews.try_recv().is_err());
    }

    #[tokio::test]
    async fn merged_stream_and_json_tag() {
        let bus = EventBus::new();
        let mut all = bus.subscribe();

        bus.preview_updated(PreviewUpdated::cleared());
        let event = all.next().await.unwrap();

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "preview_updated");
        assert!(json["creature"].is_null());
        assert!(json.get("watch").is_none());
    }

    #[tokio::test]
    async fn merged_stream_ends_with_bus() {
        let bus = EventBus::new();
        let mut all = bus.subscribe();
        drop(bus);
        assert!(all.next().await.is_none());
    }

    #[test]
    fn sending_without_listeners_is_silent() {
        let bus = EventBus::new();
        bus.phase_entered(PhaseEntered {
            phase: Phase::Init,
            generation: 0,
        });
    }
}
