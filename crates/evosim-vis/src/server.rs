//! Axum web server with WebSocket event streaming.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use evosim_orchestrator::{Orchestrator, Status};
use evosim_stats::GenerationRecord;
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::driver::{Control, Driver, DriverHandle, View};
use crate::error::{Error, Result};

/// Visualization server.
pub struct VisServer {
    driver: DriverHandle,
    task: JoinHandle<()>,
}

impl VisServer {
    /// Hand `orchestrator` to a driver task and build the server around it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(orchestrator: Orchestrator) -> Self {
        let (driver, task) = Driver::spawn(orchestrator);
        Self { driver, task }
    }

    pub fn driver(&self) -> &DriverHandle {
        &self.driver
    }

    /// Build the router for the server.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(index_handler))
            // Read access
            .route("/api/status", get(status_handler))
            .route("/api/creatures", get(creatures_handler))
            .route("/api/history", get(history_handler))
            // Controls
            .route("/api/control/{action}", post(control_handler))
            .route("/api/autoplay/start", post(autoplay_start_handler))
            .route("/api/autoplay/stop", post(autoplay_stop_handler))
            // Lifecycle events
            .route("/ws", get(ws_handler))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(self.driver.clone())
    }

    /// Run the server on `addr` until the listener fails.
    pub async fn serve(self, addr: SocketAddr) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("Evosim server running on http://{}", listener.local_addr()?);
        let router = self.router();
        let served = axum::serve(listener, router).await;
        self.task.abort();
        served?;
        Ok(())
    }
}

/// Serve the control page.
async fn index_handler() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

/// Server status response.
#[derive(Debug, Serialize)]
struct StatusResponse {
    #[serde(flatten)]
    status: Status,
    autoplay: bool,
    pending_requests: usize,
    protocol_mismatches: u64,
}

impl StatusResponse {
    fn from_driver(driver: &DriverHandle) -> Self {
        Self {
            status: driver.status(),
            autoplay: driver.is_autoplaying(),
            pending_requests: driver.rpc().pending_count(),
            protocol_mismatches: driver.rpc().mismatch_count(),
        }
    }
}

async fn status_handler(State(driver): State<DriverHandle>) -> Json<StatusResponse> {
    Json(StatusResponse::from_driver(&driver))
}

async fn creatures_handler(State(driver): State<DriverHandle>) -> Json<Arc<View>> {
    Json(driver.view())
}

async fn history_handler(State(driver): State<DriverHandle>) -> Json<Vec<Arc<GenerationRecord>>> {
    Json(driver.view().history.clone())
}

async fn control_handler(
    State(driver): State<DriverHandle>,
    Path(action): Path<String>,
) -> Result<Json<Status>> {
    let control = Control::from_name(&action).ok_or(Error::UnknownControl(action))?;
    Ok(Json(driver.apply(control).await?))
}

async fn autoplay_start_handler(
    State(driver): State<DriverHandle>,
) -> Result<Json<StatusResponse>> {
    driver.apply(Control::Autoplay).await?;
    Ok(Json(StatusResponse::from_driver(&driver)))
}

async fn autoplay_stop_handler(State(driver): State<DriverHandle>) -> Json<StatusResponse> {
    driver.stop_autoplay();
    Json(StatusResponse::from_driver(&driver))
}

/// First message on every WebSocket.
#[derive(Serialize)]
#[serde(tag = "type", rename = "status")]
struct StatusMessage {
    #[serde(flatten)]
    inner: StatusResponse,
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(driver): State<DriverHandle>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, driver))
}

async fn handle_ws(socket: WebSocket, driver: DriverHandle) {
    let mut events = driver.events().subscribe();
    let (mut sender, mut receiver) = socket.split();

    let hello = StatusMessage {
        inner: StatusResponse::from_driver(&driver),
    };
    if let Ok(json) = serde_json::to_string(&hello) {
        if sender.send(Message::Text(json.into())).await.is_err() {
            return;
        }
    }

    loop {
        tokio::select! {
            event = events.next() => {
                let Some(event) = event else { break };
                let Ok(json) = serde_json::to_string(&event) else { continue };
                if sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            },
        }
    }
    debug!("WebSocket client disconnected");
}
