//! Evosim server
//!
//! Launch the simulation engine as a child process and serve the
//! orchestrator over HTTP.
//!
//! ```text
//! evosim-vis [ENGINE_PROGRAM [ARGS...]]
//! ```

use evosim_orchestrator::{Orchestrator, OrchestratorConfig};
use evosim_rpc::EngineLink;
use evosim_vis::{VisConfig, VisServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "evosim_vis=info,evosim_orchestrator=info,evosim_rpc=info";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = VisConfig::from_env()?.with_engine_args(std::env::args().skip(1).collect());
    let orchestrator_config = OrchestratorConfig::from_env()?;

    let Some((program, args)) = config.engine_command.split_first() else {
        return Err("no engine command: set EVOSIM_ENGINE_CMD or pass it as arguments".into());
    };

    tracing::info!(%program, ?args, "Starting engine");
    let (link, mut engine) =
        EngineLink::spawn_process(program, args, orchestrator_config.rpc.channel_capacity)?;
    let orchestrator = Orchestrator::connect(link, orchestrator_config);

    let server = VisServer::new(orchestrator);
    tokio::select! {
        served = server.serve(config.listen_addr) => served?,
        exited = engine.wait() => {
            tracing::warn!(status = ?exited, "Engine exited; shutting down");
        }
    }

    Ok(())
}
