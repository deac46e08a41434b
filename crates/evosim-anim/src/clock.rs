//! Frame timing.

use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Splits real elapsed time into fixed-size simulation steps.
///
/// Elapsed time accumulates and is drained in `step` increments. At most
/// `max_steps` are released per frame; the excess is dropped so a stalled
/// frame never triggers a long catch-up burst. With `max_steps == 0` the
/// clock only renders.
#[derive(Debug, Clone)]
pub struct FrameClock {
    step: Duration,
    max_steps: u32,
    pending: Duration,
}

impl FrameClock {
    pub fn new(step: Duration, max_steps: u32) -> Self {
        Self {
            step,
            max_steps,
            pending: Duration::ZERO,
        }
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    /// Account for one frame and return how many steps to simulate.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        if self.max_steps == 0 || self.step.is_zero() {
            return 0;
        }

        self.pending += elapsed;
        let mut steps = 0;
        while self.pending >= self.step && steps < self.max_steps {
            self.pending -= self.step;
            steps += 1;
        }
        if steps == self.max_steps {
            self.pending = self.pending.min(self.step);
        }
        steps
    }
}

/// Async source of frame ticks, yielding the real time since the last tick.
#[derive(Debug)]
pub struct FrameTicker {
    interval: Interval,
    last: Option<Instant>,
}

impl FrameTicker {
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval(period.max(Duration::from_millis(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self {
            interval,
            last: None,
        }
    }

    /// Wait for the next frame. The first tick reports zero elapsed time.
    pub async fn tick(&mut self) -> Duration {
        let now = self.interval.tick().await;
        let elapsed = self.last.map_or(Duration::ZERO, |last| now - last);
        self.last = Some(now);
        elapsed
    }
}
