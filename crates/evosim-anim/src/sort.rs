//! Animated transition from arrival order to rank order.

use std::time::Duration;

use evosim_protocol::CreatureId;
use serde::Serialize;
use tracing::debug;

use crate::easing::{ease_in_out_quart, lerp};
use crate::grid::{GridLayout, GridPoint};

#[derive(Debug, Clone, Copy)]
struct Track {
    id: CreatureId,
    init: GridPoint,
    dest: GridPoint,
}

/// Progress reported by one [`SortTransition::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SortStep {
    /// Linear progress `elapsed / duration`, clamped to 1.
    pub progress: f64,
    /// Eased interpolation factor.
    pub eased: f64,
    /// True on the single step that finishes the transition.
    pub completed: bool,
}

/// Moves every creature from its id cell to its rank cell over `duration`.
///
/// Driven purely by elapsed time. Completes exactly once: the step that
/// reaches `t >= 1` reports `completed`, and every later call returns `None`.
#[derive(Debug, Clone)]
pub struct SortTransition {
    layout: GridLayout,
    tracks: Vec<Track>,
    duration: Duration,
    elapsed: Duration,
    eased: f64,
    done: bool,
}

impl SortTransition {
    /// Plan the transition for `(id, rank)` pairs on `layout`.
    pub fn new(
        layout: GridLayout,
        creatures: impl IntoIterator<Item = (CreatureId, usize)>,
        duration: Duration,
    ) -> Self {
        let tracks: Vec<Track> = creatures
            .into_iter()
            .map(|(id, rank)| Track {
                id,
                init: layout.cell(id.index()),
                dest: layout.cell(rank),
            })
            .collect();

        debug!(
            creatures = tracks.len(),
            columns = layout.columns,
            rows = layout.rows,
            ?duration,
            "Planned sort transition"
        );

        Self {
            layout,
            tracks,
            duration,
            elapsed: Duration::ZERO,
            eased: 0.0,
            done: false,
        }
    }

    pub fn layout(&self) -> GridLayout {
        self.layout
    }

    pub fn is_complete(&self) -> bool {
        self.done
    }

    /// Linear progress in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    /// Advance by one frame's elapsed time.
    pub fn advance(&mut self, elapsed: Duration) -> Option<SortStep> {
        if self.done {
            return None;
        }

        self.elapsed += elapsed;
        let t = if self.duration.is_zero() {
            1.0
        } else {
            self.elapsed.as_secs_f64() / self.duration.as_secs_f64()
        };

        if t >= 1.0 {
            self.done = true;
            self.eased = 1.0;
            return Some(SortStep {
                progress: 1.0,
                eased: 1.0,
                completed: true,
            });
        }

        self.eased = ease_in_out_quart(t);
        Some(SortStep {
            progress: t,
            eased: self.eased,
            completed: false,
        })
    }

    /// Current position of every creature.
    ///
    /// Before any elapsed time this is the id cell; once complete it is the
    /// rank cell exactly.
    pub fn positions(&self) -> Vec<(CreatureId, GridPoint)> {
        self.tracks
            .iter()
            .map(|track| (track.id, self.position_of(track)))
            .collect()
    }

    fn position_of(&self, track: &Track) -> GridPoint {
        if self.done {
            return track.dest;
        }
        GridPoint {
            x: lerp(track.init.x, track.dest.x, self.eased),
            y: lerp(track.init.y, track.dest.y, self.eased),
        }
    }
}
