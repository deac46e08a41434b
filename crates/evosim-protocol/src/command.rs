//! Outbound commands.

use serde::{Deserialize, Serialize};

/// Tag naming a command and the response that answers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandTag {
    Init,
    Start,
    Simulate,
    Reproduce,
}

impl CommandTag {
    /// Wire name of the tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandTag::Init => "init",
            CommandTag::Start => "start",
            CommandTag::Simulate => "simulate",
            CommandTag::Reproduce => "reproduce",
        }
    }
}

impl std::fmt::Display for CommandTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A command sent to the simulation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Handshake carrying the engine access key.
    Init { key: String },
    /// Generate a fresh random population.
    Start,
    /// Score the current population.
    Simulate,
    /// Cull and breed the scored population.
    Reproduce,
}

impl Command {
    /// Get the tag of this command.
    pub fn tag(&self) -> CommandTag {
        match self {
            Command::Init { .. } => CommandTag::Init,
            Command::Start => CommandTag::Start,
            Command::Simulate => CommandTag::Simulate,
            Command::Reproduce => CommandTag::Reproduce,
        }
    }
}

/// Unique identifier attached to every outbound request.
///
/// Engines that echo it back as `requestId` get exact correlation; engines
/// that don't fall back to per-tag FIFO matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Request envelope: one JSON object per outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub id: RequestId,
    #[serde(flatten)]
    pub command: Command,
}

impl Request {
    pub fn new(id: RequestId, command: Command) -> Self {
        Self { id, command }
    }

    pub fn tag(&self) -> CommandTag {
        self.command.tag()
    }
}
