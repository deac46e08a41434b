//! Follow-camera preview and watch playback loops.

use std::time::Duration;

use evosim_anim::{
    CreatureBody, FollowCamera, FrameClock, FrameTicker, SurfaceSize, WatchPlayback,
};
use evosim_protocol::{CreatureId, CreatureRecord};
use tokio::sync::watch;
use tracing::{debug, trace};

use crate::events::{EventBus, PreviewUpdated};
use crate::population::creature_info;

/// Builds physics bodies for creature records.
///
/// The body simulation lives outside the orchestrator; this is the seam it
/// plugs into for previews and watch playback.
pub trait BodyFactory {
    type Body: CreatureBody + Send;

    fn build(&self, creature: &CreatureRecord) -> Self::Body;
}

/// Frame pacing shared by preview and watch loops.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    pub frame_interval: Duration,
    pub sim_step: Duration,
    pub max_catch_up_steps: u32,
}

impl Pacing {
    fn clock(&self) -> FrameClock {
        FrameClock::new(
            self.sim_step.max(Duration::from_micros(1)),
            self.max_catch_up_steps.max(1),
        )
    }
}

/// Which creature, if any, is under the pointer.
#[derive(Debug)]
pub struct PreviewSelection {
    selected: watch::Sender<Option<CreatureId>>,
}

impl Default for PreviewSelection {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewSelection {
    pub fn new() -> Self {
        Self {
            selected: watch::Sender::new(None),
        }
    }

    /// Select `id`; returns `true` if the selection changed.
    pub fn select(&self, id: Option<CreatureId>) -> bool {
        self.selected.send_if_modified(|current| {
            if *current == id {
                return false;
            }
            *current = id;
            true
        })
    }

    pub fn clear(&self) -> bool {
        self.select(None)
    }

    pub fn current(&self) -> Option<CreatureId> {
        *self.selected.borrow()
    }

    pub fn watcher(&self) -> watch::Receiver<Option<CreatureId>> {
        self.selected.subscribe()
    }
}

/// One creature playing its own physics with the camera following it.
#[derive(Debug)]
pub struct PreviewSession<B> {
    id: CreatureId,
    info: Vec<String>,
    body: B,
    camera: FollowCamera,
    clock: FrameClock,
    pacing: Pacing,
}

impl<B: CreatureBody> PreviewSession<B> {
    pub fn new(
        creature: &CreatureRecord,
        mut body: B,
        surface: SurfaceSize,
        pacing: Pacing,
    ) -> Self {
        body.reset();
        Self {
            id: creature.id,
            info: creature_info(creature),
            body,
            camera: FollowCamera::new(surface),
            clock: pacing.clock(),
            pacing,
        }
    }

    pub fn id(&self) -> CreatureId {
        self.id
    }

    pub fn info(&self) -> &[String] {
        &self.info
    }

    /// Simulate the steps owed for `elapsed` and move the camera once.
    pub fn frame(&mut self, elapsed: Duration) -> PreviewUpdated {
        let steps = self.clock.advance(elapsed);
        let dt = self.clock.step().as_secs_f64();
        for _ in 0..steps {
            self.body.step(dt);
        }

        let position_x = self.body.position_x();
        let camera_offset = self.camera.track(position_x);
        trace!(id = %self.id, steps, position_x, camera_offset, "Preview frame");

        PreviewUpdated {
            creature: Some(self.id),
            camera_offset,
            position_x,
            watch: None,
        }
    }

    /// Run frames until `selection` no longer names this creature.
    ///
    /// Returns the number of frames rendered.
    pub async fn run(
        mut self,
        mut selection: watch::Receiver<Option<CreatureId>>,
        events: EventBus,
    ) -> u64 {
        let mut ticker = FrameTicker::new(self.pacing.frame_interval);
        let mut frames = 0;
        debug!(id = %self.id, "Preview started");

        while *selection.borrow_and_update() == Some(self.id) {
            tokio::select! {
                elapsed = ticker.tick() => {
                    events.preview_updated(self.frame(elapsed));
                    frames += 1;
                }
                changed = selection.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        if selection.borrow().is_none() {
            events.preview_updated(PreviewUpdated::cleared());
        }
        debug!(id = %self.id, frames, "Preview stopped");
        frames
    }
}

/// Play every body for one trial while following it with the camera.
pub(crate) async fn play_generation<B: CreatureBody>(
    mut playback: WatchPlayback<B>,
    ids: Vec<CreatureId>,
    surface: SurfaceSize,
    pacing: Pacing,
    events: EventBus,
) {
    let mut ticker = FrameTicker::new(pacing.frame_interval);
    let mut clock = pacing.clock();
    let dt = clock.step().as_secs_f64();
    let mut camera = FollowCamera::new(surface);
    let mut followed = None;

    loop {
        let elapsed = ticker.tick().await;
        let steps = clock.advance(elapsed);
        let running = playback.advance(steps, dt);

        if let Some(status) = playback.status() {
            if followed != Some(status.index) {
                camera.reset();
                followed = Some(status.index);
            }
            let camera_offset = camera.track(status.distance);
            events.preview_updated(PreviewUpdated {
                creature: ids.get(status.index).copied(),
                camera_offset,
                position_x: status.distance,
                watch: Some(status),
            });
        }

        if !running {
            break;
        }
    }
    debug!(creatures = ids.len(), "Watch playback finished");
}
