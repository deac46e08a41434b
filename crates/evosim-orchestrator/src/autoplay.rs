//! Unattended generation cycling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::Result;
use crate::orchestrator::Orchestrator;

/// Shared play/stop flag for autoplay.
///
/// Stopping is cooperative: the flag is read between cycles, so a cycle
/// already in flight always finishes.
#[derive(Debug, Clone, Default)]
pub struct AutoplayHandle {
    playing: Arc<AtomicBool>,
}

impl AutoplayHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag; returns `false` if it was already raised.
    pub fn start(&self) -> bool {
        !self.playing.swap(true, Ordering::SeqCst)
    }

    /// Lower the flag; returns `false` if it was already lowered.
    pub fn stop(&self) -> bool {
        self.playing.swap(false, Ordering::SeqCst)
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }
}

impl Orchestrator {
    /// Run autoplay cycles until `handle` is stopped or a cycle fails.
    ///
    /// Returns the number of completed cycles. A failure lowers the flag.
    pub async fn run_autoplay(&mut self, handle: &AutoplayHandle) -> Result<usize> {
        let mut cycles = 0;
        while handle.is_playing() {
            match self.autoplay_cycle().await {
                Ok(record) => {
                    cycles += 1;
                    info!(
                        generation = record.generation,
                        best = record.best.fitness,
                        "Autoplay cycle complete"
                    );
                }
                Err(e) => {
                    handle.stop();
                    warn!(error = %e, cycles, "Autoplay stopped by error");
                    return Err(e);
                }
            }
        }
        info!(cycles, generation = self.generation(), "Autoplay stopped");
        Ok(cycles)
    }
}
