//! Evosim RPC - request/response multiplexing over the engine channel
//!
//! The simulation engine is reachable only through one outbound and one
//! inbound message stream. The [`Multiplexer`] turns that pair into
//! `send(command) -> future<response>`:
//!
//! - Every request gets a unique [`RequestId`](evosim_protocol::RequestId)
//!   and is registered in the pending table before it is written out.
//! - A response that echoes `requestId` resolves exactly that request.
//! - A response without an id resolves the **oldest** pending request with
//!   the same tag (FIFO per tag). Two same-tag requests in flight are only
//!   safe if the engine answers them in order.
//! - A response matching nothing is logged and counted, never an error.
//!
//! # Example
//!
//! ```rust,ignore
//! let (link, endpoint) = EngineLink::channel(64);
//! let mux = Multiplexer::spawn(link, RpcConfig::default());
//!
//! // hand `endpoint` to the engine task...
//! let creatures = mux.creatures(Command::Start).await?;
//! ```

pub mod config;
pub mod error;
pub mod link;
pub mod multiplexer;
mod pending;

pub use config::RpcConfig;
pub use error::{Error, Result};
pub use link::{EngineEndpoint, EngineLink};
pub use multiplexer::Multiplexer;
