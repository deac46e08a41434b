//! Two-phase surface resize.
//!
//! A resize is first announced: every registered listener gets the new size
//! and returns a future that prepares for it. The size is committed only
//! after all of those futures settle, so nobody observes the new size while
//! a listener is still laid out for the old one.

use std::sync::Arc;

use evosim_anim::SurfaceSize;
use futures::future::{join_all, BoxFuture};
use tokio::sync::watch;
use tracing::debug;

/// Something that must prepare before the surface changes size.
pub trait ResizeListener: Send + Sync {
    fn prepare(&self, next: SurfaceSize) -> BoxFuture<'static, ()>;
}

impl<F> ResizeListener for F
where
    F: Fn(SurfaceSize) -> BoxFuture<'static, ()> + Send + Sync,
{
    fn prepare(&self, next: SurfaceSize) -> BoxFuture<'static, ()> {
        self(next)
    }
}

/// An announced resize waiting for its listeners.
#[must_use = "an announced resize does nothing until committed"]
pub struct PendingResize {
    next: SurfaceSize,
    preparations: Vec<BoxFuture<'static, ()>>,
}

impl PendingResize {
    pub fn size(&self) -> SurfaceSize {
        self.next
    }

    pub fn listeners(&self) -> usize {
        self.preparations.len()
    }
}

impl std::fmt::Debug for PendingResize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingResize")
            .field("next", &self.next)
            .field("listeners", &self.preparations.len())
            .finish()
    }
}

/// Committed surface size plus the listeners that gate changes to it.
pub struct SurfaceBarrier {
    committed: watch::Sender<SurfaceSize>,
    listeners: Vec<Arc<dyn ResizeListener>>,
}

impl SurfaceBarrier {
    pub fn new(initial: SurfaceSize) -> Self {
        Self {
            committed: watch::Sender::new(initial),
            listeners: Vec::new(),
        }
    }

    pub fn register(&mut self, listener: Arc<dyn ResizeListener>) {
        self.listeners.push(listener);
    }

    /// The committed size.
    pub fn current(&self) -> SurfaceSize {
        *self.committed.borrow()
    }

    /// Watch committed sizes.
    pub fn subscribe(&self) -> watch::Receiver<SurfaceSize> {
        self.committed.subscribe()
    }

    /// Tell every listener about `next` and collect their preparations.
    pub fn announce(&self, next: SurfaceSize) -> PendingResize {
        debug!(
            width = next.width,
            height = next.height,
            listeners = self.listeners.len(),
            "Announcing resize"
        );
        PendingResize {
            next,
            preparations: self.listeners.iter().map(|l| l.prepare(next)).collect(),
        }
    }

    /// Wait for every preparation, then publish the new size.
    pub async fn commit(&self, pending: PendingResize) -> SurfaceSize {
        join_all(pending.preparations).await;
        self.committed.send_replace(pending.next);
        debug!(width = pending.next.width, height = pending.next.height, "Committed resize");
        pending.next
    }

    /// Announce and commit in one go.
    pub async fn resize(&self, next: SurfaceSize) -> SurfaceSize {
        let pending = self.announce(next);
        self.commit(pending).await
    }
}

impl std::fmt::Debug for SurfaceBarrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceBarrier")
            .field("current", &self.current())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
