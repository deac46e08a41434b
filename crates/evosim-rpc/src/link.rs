//! Engine links: the raw message pipes underneath the multiplexer.
//!
//! A link is one outbound queue of [`Request`]s and one inbound queue of
//! [`EngineMessage`]s. It can be backed by an in-process task (tests, embedded
//! engines) or by a child process speaking JSON lines on stdin/stdout.

use std::process::Stdio;

use evosim_protocol::{EngineMessage, Request};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Orchestrator side of an engine channel.
#[derive(Debug)]
pub struct EngineLink {
    pub(crate) outbound: mpsc::Sender<Request>,
    pub(crate) inbound: mpsc::Receiver<EngineMessage>,
}

/// Engine side of an in-process channel.
#[derive(Debug)]
pub struct EngineEndpoint {
    requests: mpsc::Receiver<Request>,
    messages: mpsc::Sender<EngineMessage>,
}

impl EngineEndpoint {
    /// Wait for the next request. `None` once the orchestrator side is gone.
    pub async fn recv(&mut self) -> Option<Request> {
        self.requests.recv().await
    }

    /// Post a message to the orchestrator. Returns `false` if nobody listens.
    pub async fn post(&self, message: impl Into<EngineMessage>) -> bool {
        self.messages.send(message.into()).await.is_ok()
    }

    /// Split into the raw request receiver and message sender.
    pub fn split(self) -> (mpsc::Receiver<Request>, mpsc::Sender<EngineMessage>) {
        (self.requests, self.messages)
    }
}

impl EngineLink {
    /// Create an in-process link and the endpoint an engine task drives.
    pub fn channel(capacity: usize) -> (Self, EngineEndpoint) {
        let capacity = capacity.max(1);
        let (req_tx, req_rx) = mpsc::channel(capacity);
        let (msg_tx, msg_rx) = mpsc::channel(capacity);

        (
            Self {
                outbound: req_tx,
                inbound: msg_rx,
            },
            EngineEndpoint {
                requests: req_rx,
                messages: msg_tx,
            },
        )
    }

    /// Launch the engine as a child process speaking JSON lines.
    ///
    /// The child is killed when the returned [`Child`] is dropped. When the
    /// child exits, the inbound side closes and pending requests fail with
    /// [`Error::EngineUnavailable`].
    pub fn spawn_process(program: &str, args: &[String], capacity: usize) -> Result<(Self, Child)> {
        let mut child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::EngineUnavailable("engine stdin not captured".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::EngineUnavailable("engine stdout not captured".into()))?;

        info!(program, ?args, pid = ?child.id(), "Spawned engine process");

        let (link, endpoint) = Self::channel(capacity);
        let (requests, messages) = endpoint.split();
        tokio::spawn(write_requests(stdin, requests));
        tokio::spawn(read_messages(stdout, messages));

        Ok((link, child))
    }
}

async fn write_requests(mut stdin: ChildStdin, mut requests: mpsc::Receiver<Request>) {
    while let Some(request) = requests.recv().await {
        let mut line = match serde_json::to_vec(&request) {
            Ok(line) => line,
            Err(e) => {
                warn!(id = %request.id, error = %e, "Failed to encode request");
                continue;
            }
        };
        line.push(b'\n');

        if let Err(e) = stdin.write_all(&line).await {
            warn!(error = %e, "Engine stdin closed");
            break;
        }
        if let Err(e) = stdin.flush().await {
            warn!(error = %e, "Engine stdin flush failed");
            break;
        }
    }
    debug!("Engine writer stopped");
}

async fn read_messages(stdout: ChildStdout, messages: mpsc::Sender<EngineMessage>) {
    let mut lines = BufReader::new(stdout).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<EngineMessage>(&line) {
                    Ok(message) => {
                        if messages.send(message).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(error = %e, "Skipping malformed engine line"),
                }
            }
            Ok(None) => {
                info!("Engine stdout closed");
                break;
            }
            Err(e) => {
                warn!(error = %e, "Engine stdout read failed");
                break;
            }
        }
    }
}
