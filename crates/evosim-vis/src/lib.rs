//! Evosim Visualization
//!
//! HTTP and WebSocket front end for the generation orchestrator.
//!
//! # Architecture
//!
//! - **Driver**: a task that owns the [`Orchestrator`] and applies queued controls
//! - **REST API**: read the status, creature set and history; trigger controls
//! - **WebSocket**: streams every lifecycle event as JSON tagged with `type`
//!
//! # Usage
//!
//! ```ignore
//! let (link, _child) = EngineLink::spawn_process("node", &["engine.mjs".into()], 64)?;
//! let orchestrator = Orchestrator::connect(link, OrchestratorConfig::from_env()?);
//! VisServer::new(orchestrator).serve(config.listen_addr).await?;
//! ```
//!
//! [`Orchestrator`]: evosim_orchestrator::Orchestrator

mod config;
mod driver;
mod error;
mod server;

pub use config::VisConfig;
pub use driver::{Control, Driver, DriverHandle, View};
pub use error::{Error, Result};
pub use server::VisServer;
