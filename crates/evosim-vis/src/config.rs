//! Server configuration.

use std::net::SocketAddr;

use crate::error::{Error, Result};

/// Configuration for the `evosim-vis` binary.
#[derive(Debug, Clone, PartialEq)]
pub struct VisConfig {
    /// HTTP and WebSocket listen address
    pub listen_addr: SocketAddr,

    /// Engine program followed by its arguments
    pub engine_command: Vec<String>,
}

impl Default for VisConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            engine_command: Vec::new(),
        }
    }
}

impl VisConfig {
    /// Create config from `EVOSIM_LISTEN_ADDR` and `EVOSIM_ENGINE_CMD`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(addr) = lookup("EVOSIM_LISTEN_ADDR") {
            config.listen_addr = addr.trim().parse().map_err(|_| {
                Error::Config(format!("EVOSIM_LISTEN_ADDR: invalid address {addr:?}"))
            })?;
        }

        if let Some(cmd) = lookup("EVOSIM_ENGINE_CMD") {
            config.engine_command = cmd.split_whitespace().map(str::to_string).collect();
        }

        Ok(config)
    }

    /// Replace the engine command when `args` is non-empty.
    #[must_use]
    pub fn with_engine_args(mut self, args: Vec<String>) -> Self {
        if !args.is_empty() {
            self.engine_command = args;
        }
        self
    }
}
