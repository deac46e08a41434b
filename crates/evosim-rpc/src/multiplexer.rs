//! The request/response multiplexer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use evosim_protocol::{Command, CreatureRecord, EngineMessage, Request, RequestId, Response};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

use crate::config::RpcConfig;
use crate::error::{Error, Result};
use crate::link::EngineLink;
use crate::pending::PendingTable;

struct Inner {
    outbound: mpsc::Sender<Request>,
    pending: Mutex<PendingTable>,
    next_id: AtomicU64,
    mismatches: AtomicU64,
    config: RpcConfig,
}

impl Inner {
    fn pending(&self) -> MutexGuard<'_, PendingTable> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Multiplexes commands over a single engine link.
///
/// Cheap to clone; all clones share the same pending table. A background
/// dispatcher task routes inbound responses to their waiting callers.
#[derive(Clone)]
pub struct Multiplexer {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Multiplexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Multiplexer")
            .field("pending", &self.pending_count())
            .field("mismatches", &self.mismatch_count())
            .finish()
    }
}

impl Multiplexer {
    /// Take ownership of a link and start the response dispatcher.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(link: EngineLink, config: RpcConfig) -> Self {
        let EngineLink { outbound, inbound } = link;
        let inner = Arc::new(Inner {
            outbound,
            pending: Mutex::new(PendingTable::default()),
            next_id: AtomicU64::new(0),
            mismatches: AtomicU64::new(0),
            config,
        });

        tokio::spawn(dispatch(Arc::clone(&inner), inbound));
        Self { inner }
    }

    /// Send a command and wait for its response.
    ///
    /// Without a configured timeout this waits as long as the engine link
    /// stays open. Dropping the returned future forgets the request, so a
    /// late response for it counts as unmatched.
    pub async fn send(&self, command: Command) -> Result<Response> {
        let id = self.next_id();
        let tag = command.tag();
        let (tx, rx) = oneshot::channel();

        if self.inner.pending().push(id, tag, tx).is_err() {
            return Err(Error::EngineUnavailable("engine link closed".into()));
        }
        let _registered = Registered {
            inner: &self.inner,
            id,
        };

        if self.inner.outbound.send(Request::new(id, command)).await.is_err() {
            return Err(Error::EngineUnavailable("engine channel closed".into()));
        }
        debug!(%id, %tag, "Sent engine request");

        let reply = match self.inner.config.request_timeout {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(reply) => reply,
                Err(_) => {
                    warn!(%id, %tag, ?limit, "Engine request timed out");
                    return Err(Error::Timeout(limit));
                }
            },
            None => rx.await,
        };

        reply.map_err(|_| Error::EngineUnavailable("engine link closed before responding".into()))
    }

    /// Send a command whose response carries a creature set.
    pub async fn creatures(&self, command: Command) -> Result<Vec<CreatureRecord>> {
        let tag = command.tag();
        let response = self.send(command).await?;
        response.creatures.ok_or_else(|| Error::UnexpectedPayload {
            tag,
            reason: "response carried no creatures".into(),
        })
    }

    /// Send a command without waiting for (or registering) a response.
    pub async fn notify(&self, command: Command) -> Result<()> {
        let id = self.next_id();
        let tag = command.tag();
        self.inner
            .outbound
            .send(Request::new(id, command))
            .await
            .map_err(|_| Error::EngineUnavailable("engine channel closed".into()))?;
        trace!(%id, %tag, "Sent fire-and-forget request");
        Ok(())
    }

    /// Number of requests still waiting for a response.
    pub fn pending_count(&self) -> usize {
        self.inner.pending().len()
    }

    /// Number of responses that matched no pending request.
    pub fn mismatch_count(&self) -> u64 {
        self.inner.mismatches.load(Ordering::Relaxed)
    }

    fn next_id(&self) -> RequestId {
        RequestId(self.inner.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

/// Removes a request from the pending table when its caller stops waiting.
struct Registered<'a> {
    inner: &'a Inner,
    id: RequestId,
}

impl Drop for Registered<'_> {
    fn drop(&mut self) {
        if let Some(abandoned) = self.inner.pending().remove(self.id) {
            debug!(id = %abandoned.id, tag = %abandoned.tag, "Forgot abandoned engine request");
        }
    }
}

async fn dispatch(inner: Arc<Inner>, mut inbound: mpsc::Receiver<EngineMessage>) {
    while let Some(message) = inbound.recv().await {
        let response = match message {
            EngineMessage::Response(response) => response,
            EngineMessage::Other => {
                trace!("Ignoring non-response engine message");
                continue;
            }
        };

        let tag = response.response;
        let resolved = inner.pending().resolve(response);
        match resolved {
            Ok(id) => debug!(%id, %tag, "Resolved engine request"),
            Err(unmatched) => {
                inner.mismatches.fetch_add(1, Ordering::Relaxed);
                warn!(
                    %tag,
                    request_id = ?unmatched.request_id,
                    "Engine response matches no pending request; dropped"
                );
            }
        }
    }

    let dropped = inner.pending().close();
    warn!(dropped, "Engine link closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::EngineEndpoint;
    use evosim_protocol::{CommandTag, CreatureId};
    use std::time::Duration;

    fn creatures(ids: &[u32]) -> Vec<CreatureRecord> {
        ids.iter().map(|&id| CreatureRecord::new(CreatureId(id))).collect()
    }

    fn setup(config: RpcConfig) -> (Multiplexer, EngineEndpoint) {
        let (link, endpoint) = EngineLink::channel(8);
        (Multiplexer::spawn(link, config), endpoint)
    }

    #[tokio::test]
    async fn same_tag_requests_resolve_in_fifo_order() {
        let (mux, mut engine) = setup(RpcConfig::default());

        let first = tokio::spawn({
            let mux = mux.clone();
            async move { mux.creatures(Command::Simulate).await }
        });
        let req_a = engine.recv().await.unwrap();

        let second = tokio::spawn({
            let mux = mux.clone();
            async move { mux.creatures(Command::Simulate).await }
        });
        let req_b = engine.recv().await.unwrap();
        assert!(req_a.id < req_b.id);

        // No ids echoed: correlation is by tag arrival order only.
        engine
            .post(Response::with_creatures(CommandTag::Simulate, creatures(&[1])))
            .await;
        engine
            .post(Response::with_creatures(CommandTag::Simulate, creatures(&[2])))
            .await;

        assert_eq!(first.await.unwrap().unwrap()[0].id, CreatureId(1));
        assert_eq!(second.await.unwrap().unwrap()[0].id, CreatureId(2));
    }

    #[tokio::test]
    async fn echoed_ids_correlate_out_of_order() {
        let (mux, mut engine) = setup(RpcConfig::default());

        let first = tokio::spawn({
            let mux = mux.clone();
            async move { mux.creatures(Command::Simulate).await }
        });
        let req_a = engine.recv().await.unwrap();
        let second = tokio::spawn({
            let mux = mux.clone();
            async move { mux.creatures(Command::Simulate).await }
        });
        let req_b = engine.recv().await.unwrap();

        engine
            .post(Response::with_creatures(CommandTag::Simulate, creatures(&[20])).echoing(req_b.id))
            .await;
        engine
            .post(Response::with_creatures(CommandTag::Simulate, creatures(&[10])).echoing(req_a.id))
            .await;

        assert_eq!(first.await.unwrap().unwrap()[0].id, CreatureId(10));
        assert_eq!(second.await.unwrap().unwrap()[0].id, CreatureId(20));
    }

    #[tokio::test]
    async fn different_tags_resolve_independently() {
        let (mux, mut engine) = setup(RpcConfig::default());

        let sim = tokio::spawn({
            let mux = mux.clone();
            async move { mux.send(Command::Simulate).await }
        });
        engine.recv().await.unwrap();
        let rep = tokio::spawn({
            let mux = mux.clone();
            async move { mux.send(Command::Reproduce).await }
        });
        engine.recv().await.unwrap();

        engine.post(Response::ack(CommandTag::Reproduce)).await;
        assert_eq!(rep.await.unwrap().unwrap().response, CommandTag::Reproduce);
        assert!(!sim.is_finished());

        engine.post(Response::ack(CommandTag::Simulate)).await;
        assert_eq!(sim.await.unwrap().unwrap().response, CommandTag::Simulate);
        assert_eq!(mux.pending_count(), 0);
    }

    #[tokio::test]
    async fn unmatched_responses_are_counted_and_dropped() {
        let (mux, engine) = setup(RpcConfig::default());

        engine.post(Response::ack(CommandTag::Start)).await;
        engine.post(EngineMessage::Other).await;

        // Let the dispatcher drain.
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(mux.mismatch_count(), 1);
    }

    #[tokio::test]
    async fn closed_engine_rejects_send() {
        let (mux, engine) = setup(RpcConfig::default());
        drop(engine);

        let err = mux.send(Command::Start).await.unwrap_err();
        assert!(matches!(err, Error::EngineUnavailable(_)));
    }

    #[tokio::test]
    async fn engine_exit_fails_pending_requests() {
        let (mux, mut engine) = setup(RpcConfig::default());

        let pending = tokio::spawn({
            let mux = mux.clone();
            async move { mux.send(Command::Simulate).await }
        });
        engine.recv().await.unwrap();
        drop(engine);

        let err = pending.await.unwrap().unwrap_err();
        assert!(matches!(err, Error::EngineUnavailable(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn configured_timeout_expires() {
        let (mux, mut engine) = setup(RpcConfig::default().with_timeout(Duration::from_secs(2)));

        let pending = tokio::spawn({
            let mux = mux.clone();
            async move { mux.send(Command::Reproduce).await }
        });
        engine.recv().await.unwrap();

        let err = pending.await.unwrap().unwrap_err();
        assert!(matches!(err, Error::Timeout(d) if d == Duration::from_secs(2)));
        assert_eq!(mux.pending_count(), 0);
    }

    #[tokio::test]
    async fn unanswered_request_stays_pending() {
        let (mux, mut engine) = setup(RpcConfig::default());

        let mut fut = tokio_test::task::spawn(mux.send(Command::Simulate));
        tokio_test::assert_pending!(fut.poll());

        engine.recv().await.unwrap();
        tokio_test::assert_pending!(fut.poll());
        assert_eq!(mux.pending_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_send_is_forgotten() {
        let (mux, mut engine) = setup(RpcConfig::default());

        let waited = tokio::time::timeout(Duration::from_secs(5), mux.send(Command::Simulate)).await;
        assert!(waited.is_err());
        let abandoned = engine.recv().await.unwrap();
        assert_eq!(mux.pending_count(), 0);

        let retry = tokio::spawn({
            let mux = mux.clone();
            async move { mux.creatures(Command::Simulate).await }
        });
        let live = engine.recv().await.unwrap();
        assert!(abandoned.id < live.id);

        // A tag-only response now goes to the live request.
        engine
            .post(Response::with_creatures(CommandTag::Simulate, creatures(&[7])))
            .await;
        assert_eq!(retry.await.unwrap().unwrap()[0].id, CreatureId(7));
        assert_eq!(mux.pending_count(), 0);
    }

    #[tokio::test]
    async fn notify_registers_nothing() {
        let (mux, mut engine) = setup(RpcConfig::default());

        mux.notify(Command::Init { key: "epic".into() }).await.unwrap();
        let request = engine.recv().await.unwrap();
        assert_eq!(request.tag(), CommandTag::Init);
        assert_eq!(mux.pending_count(), 0);
    }

    #[tokio::test]
    async fn missing_creatures_is_unexpected_payload() {
        let (mux, mut engine) = setup(RpcConfig::default());

        let pending = tokio::spawn({
            let mux = mux.clone();
            async move { mux.creatures(Command::Start).await }
        });
        engine.recv().await.unwrap();
        engine.post(Response::ack(CommandTag::Start)).await;

        let err = pending.await.unwrap().unwrap_err();
        assert!(matches!(err, Error::UnexpectedPayload { tag: CommandTag::Start, .. }));
    }
}
