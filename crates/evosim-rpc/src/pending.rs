//! Pending request table.

use std::collections::VecDeque;

use evosim_protocol::{CommandTag, RequestId, Response};
use tokio::sync::oneshot;

/// An outbound request waiting for its response.
#[derive(Debug)]
pub(crate) struct PendingRequest {
    pub id: RequestId,
    pub tag: CommandTag,
    resolver: oneshot::Sender<Response>,
}

/// Requests in the order they were sent.
#[derive(Debug, Default)]
pub(crate) struct PendingTable {
    entries: VecDeque<PendingRequest>,
    closed: bool,
}

impl PendingTable {
    /// Register a request. Fails once the link has closed.
    pub fn push(
        &mut self,
        id: RequestId,
        tag: CommandTag,
        resolver: oneshot::Sender<Response>,
    ) -> Result<(), oneshot::Sender<Response>> {
        if self.closed {
            return Err(resolver);
        }
        self.entries.push_back(PendingRequest { id, tag, resolver });
        Ok(())
    }

    /// Forget a request whose caller stopped waiting.
    pub fn remove(&mut self, id: RequestId) -> Option<PendingRequest> {
        let pos = self.entries.iter().position(|p| p.id == id)?;
        self.entries.remove(pos)
    }

    /// Resolve the request a response belongs to.
    ///
    /// An echoed id selects exactly that request; otherwise the oldest
    /// pending request with the same tag wins. Hands the response back if
    /// nothing matches.
    pub fn resolve(&mut self, response: Response) -> Result<RequestId, Response> {
        let tag = response.response;
        let pos = match response.request_id {
            Some(id) => self.entries.iter().position(|p| p.id == id && p.tag == tag),
            None => self.entries.iter().position(|p| p.tag == tag),
        };

        let Some(entry) = pos.and_then(|pos| self.entries.remove(pos)) else {
            return Err(response);
        };

        // The caller may have given up (timeout); nothing to do then.
        let _ = entry.resolver.send(response);
        Ok(entry.id)
    }

    /// Drop every resolver and refuse new requests.
    pub fn close(&mut self) -> usize {
        self.closed = true;
        let dropped = self.entries.len();
        self.entries.clear();
        dropped
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
