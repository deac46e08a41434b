//! Evosim Protocol
//!
//! Wire types exchanged with the simulation engine over its single
//! request/response channel.
//!
//! The engine owns physics and the genetic operators. This crate only knows
//! the envelope: which command was asked for, which response came back, and
//! the handful of creature fields the orchestrator reads (`id`, `fitness`,
//! `rank`, `willDie`, and the lengths of `nodes`/`muscles`). Everything else
//! on a creature record is carried through untouched.
//!
//! # Example
//!
//! ```
//! use evosim_protocol::{Command, Request, RequestId};
//!
//! let req = Request::new(RequestId(1), Command::Simulate);
//! let line = serde_json::to_string(&req).unwrap();
//! assert_eq!(line, r#"{"id":1,"type":"simulate"}"#);
//! ```

mod command;
mod creature;
mod message;

pub use command::{Command, CommandTag, Request, RequestId};
pub use creature::{CreatureId, CreatureRecord, MorphologyClass};
pub use message::{EngineMessage, Response};
