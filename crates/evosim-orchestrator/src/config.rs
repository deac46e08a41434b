//! Orchestrator configuration.

use std::time::Duration;

use evosim_anim::SurfaceSize;
use evosim_rpc::RpcConfig;

use crate::error::{Error, Result};

/// Configuration for an [`Orchestrator`](crate::Orchestrator).
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Key sent with the `init` command.
    pub access_key: String,

    /// Length of the animated sort transition.
    pub sort_duration: Duration,

    /// Period between animation frames.
    pub frame_interval: Duration,

    /// Fixed simulation step for preview and watch playback.
    pub sim_step: Duration,

    /// Simulated time each creature gets during watch playback.
    pub watch_trial: Duration,

    /// Most simulation steps released in one frame.
    pub max_catch_up_steps: u32,

    /// Initial drawing surface size.
    pub surface: SurfaceSize,

    /// Engine channel settings.
    pub rpc: RpcConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            access_key: "epic".to_string(),
            sort_duration: Duration::from_secs(3),
            frame_interval: Duration::from_secs(1) / 60,
            sim_step: Duration::from_secs(1) / 60,
            watch_trial: Duration::from_secs(15),
            max_catch_up_steps: 8,
            surface: SurfaceSize::default(),
            rpc: RpcConfig::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Create config from environment variables, falling back to defaults.
    ///
    /// Reads `EVOSIM_ACCESS_KEY`, `EVOSIM_REQUEST_TIMEOUT_MS`,
    /// `EVOSIM_SORT_MS`, `EVOSIM_FRAME_HZ` and `EVOSIM_SURFACE` (`WxH`).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(key) = lookup("EVOSIM_ACCESS_KEY") {
            config.access_key = key;
        }

        if let Some(ms) = lookup("EVOSIM_REQUEST_TIMEOUT_MS") {
            let ms: u64 = parse_int("EVOSIM_REQUEST_TIMEOUT_MS", &ms)?;
            config.rpc = if ms == 0 {
                config.rpc.without_timeout()
            } else {
                config.rpc.with_timeout(Duration::from_millis(ms))
            };
        }

        if let Some(ms) = lookup("EVOSIM_SORT_MS") {
            config.sort_duration = Duration::from_millis(parse_int("EVOSIM_SORT_MS", &ms)?);
        }

        if let Some(hz) = lookup("EVOSIM_FRAME_HZ") {
            let hz: u32 = parse_int("EVOSIM_FRAME_HZ", &hz)?;
            if hz == 0 {
                return Err(Error::Config("EVOSIM_FRAME_HZ must be positive".into()));
            }
            config.frame_interval = Duration::from_secs(1) / hz;
        }

        if let Some(surface) = lookup("EVOSIM_SURFACE") {
            config.surface = parse_surface(&surface)?;
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_access_key(mut self, key: impl Into<String>) -> Self {
        self.access_key = key.into();
        self
    }

    #[must_use]
    pub fn with_sort_duration(mut self, duration: Duration) -> Self {
        self.sort_duration = duration;
        self
    }

    #[must_use]
    pub fn with_watch_trial(mut self, trial: Duration) -> Self {
        self.watch_trial = trial;
        self
    }

    #[must_use]
    pub fn with_surface(mut self, surface: SurfaceSize) -> Self {
        self.surface = surface;
        self
    }

    #[must_use]
    pub fn with_rpc(mut self, rpc: RpcConfig) -> Self {
        self.rpc = rpc;
        self
    }
}

fn parse_int<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{name}: expected an integer, got {value:?}")))
}

fn parse_surface(value: &str) -> Result<SurfaceSize> {
    let invalid = || Error::Config(format!("EVOSIM_SURFACE: expected WxH, got {value:?}"));

    let (w, h) = value.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
    let width: f64 = w.trim().parse().map_err(|_| invalid())?;
    let height: f64 = h.trim().parse().map_err(|_| invalid())?;
    if !(width > 0.0 && height > 0.0) {
        return Err(invalid());
    }
    Ok(SurfaceSize::new(width, height))
}
