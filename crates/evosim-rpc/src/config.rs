//! Multiplexer configuration.

use std::time::Duration;

/// Configuration for a [`Multiplexer`](crate::Multiplexer).
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// How long a request may wait for its response.
    /// `None` waits forever, which is how the engine protocol behaves natively.
    pub request_timeout: Option<Duration>,

    /// Capacity of the in-process request and response queues.
    pub channel_capacity: usize,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            request_timeout: None,
            channel_capacity: 64,
        }
    }
}

impl RpcConfig {
    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Disable the request timeout.
    #[must_use]
    pub fn without_timeout(mut self) -> Self {
        self.request_timeout = None;
        self
    }

    /// Set the queue capacity.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }
}
