//! Inbound messages from the engine.

use serde::{Deserialize, Serialize};

use crate::command::{CommandTag, RequestId};
use crate::creature::CreatureRecord;

/// Any message the engine may post on the channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineMessage {
    /// Answer to a previously sent command.
    Response(Response),
    /// Anything else (progress chatter, logs); ignored by the orchestrator.
    #[serde(other)]
    Other,
}

/// Response payload, tagged with the command it answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub response: CommandTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creatures: Option<Vec<CreatureRecord>>,
}

impl Response {
    /// Bare acknowledgement with no creature data.
    pub fn ack(tag: CommandTag) -> Self {
        Self {
            response: tag,
            request_id: None,
            creatures: None,
        }
    }

    pub fn with_creatures(tag: CommandTag, creatures: Vec<CreatureRecord>) -> Self {
        Self {
            response: tag,
            request_id: None,
            creatures: Some(creatures),
        }
    }

    /// Echo the request id so the multiplexer can correlate exactly.
    pub fn echoing(mut self, id: RequestId) -> Self {
        self.request_id = Some(id);
        self
    }
}

impl From<Response> for EngineMessage {
    fn from(response: Response) -> Self {
        EngineMessage::Response(response)
    }
}
