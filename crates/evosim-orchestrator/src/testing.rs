//! In-process engine stand-in for unit tests.

use std::time::Duration;

use evosim_anim::CreatureBody;
use evosim_protocol::{Command, CreatureId, CreatureRecord, Response};
use evosim_rpc::EngineLink;
use serde_json::json;

use crate::config::OrchestratorConfig;
use crate::orchestrator::Orchestrator;
use crate::preview::BodyFactory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    None,
    /// Two creatures share a rank in every scored set.
    DuplicateRanks,
    /// Breeding returns one creature fewer.
    ShrinkOnBreed,
    /// The engine goes away when asked to score.
    HangUpOnSimulate,
    /// The engine goes away when asked to score a second time.
    HangUpOnRescore,
    /// Breeding requests are never answered.
    IgnoreReproduce,
}

pub fn creature(id: u32) -> CreatureRecord {
    let mut c = CreatureRecord::new(CreatureId(id));
    c.nodes = vec![json!({}); 3 + (id % 2) as usize];
    c.muscles = vec![json!({}); 4];
    c
}

/// Fitness grows with id, so rank is `n - 1 - id`. Sent best first.
pub fn scored(n: u32, fault: Fault) -> Vec<CreatureRecord> {
    (0..n)
        .rev()
        .map(|id| {
            let rank = (n - 1 - id) as usize;
            let mut c = creature(id);
            c.fitness = Some(id as f64 * 1.5);
            c.rank = Some(match fault {
                Fault::DuplicateRanks => rank.max(1),
                _ => rank,
            });
            c.will_die = Some(rank >= n as usize / 2);
            c
        })
        .collect()
}

pub fn spawn_engine(n: u32, fault: Fault) -> EngineLink {
    let (link, mut endpoint) = EngineLink::channel(8);
    tokio::spawn(async move {
        let mut rounds = 0;
        while let Some(request) = endpoint.recv().await {
            let tag = request.tag();
            let response = match request.command {
                Command::Init { .. } => Response::ack(tag),
                Command::Start => Response::with_creatures(tag, (0..n).map(creature).collect()),
                Command::Simulate => {
                    rounds += 1;
                    match fault {
                        Fault::HangUpOnSimulate => return,
                        Fault::HangUpOnRescore if rounds > 1 => return,
                        _ => Response::with_creatures(tag, scored(n, fault)),
                    }
                }
                Command::Reproduce if fault == Fault::IgnoreReproduce => continue,
                Command::Reproduce => {
                    let size = if fault == Fault::ShrinkOnBreed { n - 1 } else { n };
                    Response::with_creatures(tag, (0..size).map(creature).collect())
                }
            };
            endpoint.post(response.echoing(request.id)).await;
        }
    });
    link
}

pub fn config() -> OrchestratorConfig {
    let mut config = OrchestratorConfig::default()
        .with_sort_duration(Duration::from_millis(100))
        .with_watch_trial(Duration::from_millis(50));
    config.frame_interval = Duration::from_millis(10);
    config.sim_step = Duration::from_millis(10);
    config
}

pub fn orchestrator(n: u32, fault: Fault) -> Orchestrator {
    Orchestrator::connect(spawn_engine(n, fault), config())
}

/// Drive a fresh orchestrator to `ResultsPending` for generation zero.
pub async fn ready(n: u32, fault: Fault) -> Orchestrator {
    let mut orchestrator = orchestrator(n, fault);
    orchestrator.init().await.unwrap();
    orchestrator.start().await.unwrap();
    orchestrator.confirm_gen0().unwrap();
    orchestrator
}

#[derive(Debug, Default)]
pub struct Crawler {
    pub x: f64,
}

impl CreatureBody for Crawler {
    fn step(&mut self, dt: f64) {
        self.x += dt;
    }
    fn position_x(&self) -> f64 {
        self.x
    }
    fn reset(&mut self) {
        self.x = 0.0;
    }
}

pub struct CrawlerFactory;

impl BodyFactory for CrawlerFactory {
    type Body = Crawler;

    fn build(&self, _creature: &CreatureRecord) -> Crawler {
        Crawler::default()
    }
}
