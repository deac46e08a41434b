//! The task that owns the orchestrator.
//!
//! HTTP handlers never touch the orchestrator directly. Controls go through
//! a queue and are applied one at a time; read access goes through watch
//! channels the driver keeps current. Stopping autoplay skips the queue and
//! lowers the shared flag, which the driver reads between cycles.

use std::sync::Arc;

use evosim_orchestrator::{
    AutoplayHandle, DisplayCell, Error as OrchestratorError, EventBus, Orchestrator, Phase, Status,
};
use evosim_protocol::CreatureRecord;
use evosim_rpc::Multiplexer;
use evosim_stats::GenerationRecord;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};

const CONTROL_QUEUE: usize = 16;

/// A user control, as exposed under `/api/control/{name}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Handshake if needed, then create generation zero.
    Start,
    /// Accept generation zero.
    Confirm,
    Simulate,
    Sort,
    Cull,
    Reproduce,
    /// Accept a bred generation.
    Continue,
    /// Begin autoplay.
    Autoplay,
}

impl Control {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "start" => Self::Start,
            "confirm" => Self::Confirm,
            "simulate" => Self::Simulate,
            "sort" => Self::Sort,
            "cull" => Self::Cull,
            "reproduce" => Self::Reproduce,
            "continue" => Self::Continue,
            _ => return None,
        })
    }
}

/// Creature set and history as last published by the driver.
#[derive(Debug, Clone, Default, Serialize)]
pub struct View {
    pub creatures: Vec<CreatureRecord>,
    pub cells: Vec<DisplayCell>,
    pub history: Vec<Arc<GenerationRecord>>,
}

struct ControlRequest {
    control: Control,
    reply: oneshot::Sender<Result<Status>>,
}

/// Cloneable access to a running driver.
#[derive(Debug, Clone)]
pub struct DriverHandle {
    controls: mpsc::Sender<ControlRequest>,
    status: watch::Receiver<Status>,
    view: watch::Receiver<Arc<View>>,
    events: EventBus,
    autoplay: AutoplayHandle,
    rpc: Multiplexer,
}

impl DriverHandle {
    /// Queue a control and wait for it to be applied.
    pub async fn apply(&self, control: Control) -> Result<Status> {
        let (reply, rx) = oneshot::channel();
        self.controls
            .send(ControlRequest { control, reply })
            .await
            .map_err(|_| Error::DriverStopped)?;
        rx.await.map_err(|_| Error::DriverStopped)?
    }

    /// Lower the autoplay flag. The cycle in flight still finishes.
    pub fn stop_autoplay(&self) -> bool {
        self.autoplay.stop()
    }

    pub fn is_autoplaying(&self) -> bool {
        self.autoplay.is_playing()
    }

    pub fn status(&self) -> Status {
        self.status.borrow().clone()
    }

    pub fn view(&self) -> Arc<View> {
        Arc::clone(&self.view.borrow())
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn rpc(&self) -> &Multiplexer {
        &self.rpc
    }
}

/// Owns the orchestrator and serves controls from the queue.
pub struct Driver {
    orchestrator: Orchestrator,
    controls: mpsc::Receiver<ControlRequest>,
    view: watch::Sender<Arc<View>>,
    autoplay: AutoplayHandle,
}

impl Driver {
    /// Move `orchestrator` into a new task and return a handle to it.
    ///
    /// The task sends the engine handshake before serving controls. It ends
    /// once every [`DriverHandle`] is dropped.
    pub fn spawn(orchestrator: Orchestrator) -> (DriverHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(CONTROL_QUEUE);
        let (view, view_rx) = watch::channel(Arc::new(View::default()));
        let autoplay = AutoplayHandle::new();

        let handle = DriverHandle {
            controls: tx,
            status: orchestrator.status(),
            view: view_rx,
            events: orchestrator.events().clone(),
            autoplay: autoplay.clone(),
            rpc: orchestrator.rpc().clone(),
        };

        let driver = Self {
            orchestrator,
            controls: rx,
            view,
            autoplay,
        };
        (handle, tokio::spawn(driver.run()))
    }

    async fn run(mut self) {
        if let Err(e) = self.orchestrator.init().await {
            warn!(error = %e, "Engine handshake failed; retry with start");
        }
        self.publish_view();

        loop {
            if self.autoplay.is_playing() {
                self.autoplay_cycle().await;
                continue;
            }

            let Some(request) = self.controls.recv().await else {
                break;
            };
            debug!(control = ?request.control, "Applying control");
            let result = self.apply(request.control).await;
            self.publish_view();
            let status = self.orchestrator.status().borrow().clone();
            let _ = request.reply.send(result.map(|()| status));
        }
        info!("Orchestrator driver stopped");
    }

    async fn apply(&mut self, control: Control) -> Result<()> {
        let orchestrator = &mut self.orchestrator;
        match control {
            Control::Start => {
                if orchestrator.phase() == Phase::Init {
                    orchestrator.init().await?;
                }
                orchestrator.start().await?;
            }
            Control::Confirm => orchestrator.confirm_gen0()?,
            Control::Simulate => {
                orchestrator.simulate().await?;
            }
            Control::Sort => orchestrator.sort().await?,
            Control::Cull => orchestrator.cull()?,
            Control::Reproduce => orchestrator.reproduce().await?,
            Control::Continue => orchestrator.confirm_breeding()?,
            Control::Autoplay => {
                let phase = orchestrator.phase();
                if !matches!(phase, Phase::ResultsPending | Phase::BreedingReview) {
                    return Err(OrchestratorError::InvalidPhase {
                        expected: "ResultsPending or BreedingReview",
                        actual: phase,
                    }
                    .into());
                }
                if !self.autoplay.start() {
                    return Err(OrchestratorError::Busy.into());
                }
                info!(generation = orchestrator.generation(), "Autoplay started");
            }
        }
        Ok(())
    }

    /// Run one autoplay cycle, turning away controls that arrive meanwhile.
    async fn autoplay_cycle(&mut self) {
        let result = {
            let controls = &mut self.controls;
            let cycle = self.orchestrator.autoplay_cycle();
            tokio::pin!(cycle);

            loop {
                tokio::select! {
                    result = &mut cycle => break result,
                    Some(request) = controls.recv() => {
                        debug!(control = ?request.control, "Control refused during autoplay");
                        let _ = request.reply.send(Err(OrchestratorError::Busy.into()));
                    }
                }
            }
        };

        if let Err(e) = result {
            self.autoplay.stop();
            error!(error = %e, "Autoplay cycle failed");
        }
        self.publish_view();
    }

    fn publish_view(&self) {
        let population = self.orchestrator.population();
        self.view.send_replace(Arc::new(View {
            creatures: population.records().to_vec(),
            cells: population.cells(),
            history: self.orchestrator.history().to_vec(),
        }));
    }
}
