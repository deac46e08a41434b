//! Creature-by-creature playback of a whole generation.

use std::time::Duration;

use serde::Serialize;

use crate::body::CreatureBody;

/// Playback heads-up display state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WatchStatus {
    /// Zero-based index of the creature on stage.
    pub index: usize,
    pub total: usize,
    /// Simulated seconds into this creature's trial.
    pub clock: f64,
    /// Horizontal distance covered so far.
    pub distance: f64,
}

impl std::fmt::Display for WatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Creature {} of {}", self.index + 1, self.total)?;
        writeln!(f, "Time: {:.2}s", self.clock)?;
        write!(f, "Distance: {:.2}m", self.distance)
    }
}

/// Plays each body for one trial length, then moves on to the next.
#[derive(Debug)]
pub struct WatchPlayback<B> {
    bodies: Vec<B>,
    trial: f64,
    current: Option<usize>,
    clock: f64,
    finished: bool,
}

impl<B: CreatureBody> WatchPlayback<B> {
    pub fn new(bodies: Vec<B>, trial: Duration) -> Self {
        Self {
            bodies,
            trial: trial.as_secs_f64(),
            current: None,
            clock: 0.0,
            finished: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Run one fixed simulation step of `dt` seconds.
    ///
    /// Returns `false` once every creature has had its trial.
    pub fn step(&mut self, dt: f64) -> bool {
        if self.finished {
            return false;
        }

        let index = match self.current {
            Some(index) if self.clock <= self.trial => index,
            previous => {
                let next = previous.map_or(0, |i| i + 1);
                self.clock = 0.0;
                if next >= self.bodies.len() {
                    self.current = None;
                    self.finished = true;
                    return false;
                }
                self.bodies[next].reset();
                self.current = Some(next);
                next
            }
        };

        self.bodies[index].step(dt);
        self.clock += dt;
        true
    }

    /// Run `steps` fixed steps; returns `false` once finished.
    pub fn advance(&mut self, steps: u32, dt: f64) -> bool {
        for _ in 0..steps {
            if !self.step(dt) {
                return false;
            }
        }
        !self.finished
    }

    pub fn status(&self) -> Option<WatchStatus> {
        let index = self.current?;
        Some(WatchStatus {
            index,
            total: self.bodies.len(),
            clock: self.clock,
            distance: self.bodies[index].position_x(),
        })
    }

    pub fn current_body(&self) -> Option<&B> {
        self.current.map(|i| &self.bodies[i])
    }
}
