//! Native WebSocket client for connecting to the tracker server
//!
//! One tokio task owns the socket and is the only writer of the tracker
//! state. Frames are applied strictly in arrival order. When the socket
//! closes or errors the task waits the retry delay and connects again,
//! forever, until the client is shut down or dropped.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::core::{apply_frame, TrackerConfig, TrackerHandle, TrackerState};
use crate::error::{Result, TrackerError};

/// One inbound frame, reduced to what the tracker reacts to
#[derive(Clone, Debug, PartialEq)]
pub enum Inbound {
    Text(String),
    /// Close frame with its reason, if any
    Close(Option<String>),
    /// Binary, ping, pong
    Other,
}

/// An open socket session
pub trait Socket: Send {
    /// Next frame, `None` once the stream has ended.
    fn next_frame(&mut self) -> BoxFuture<'_, Option<Result<Inbound>>>;

    /// Best-effort close.
    fn close(&mut self) -> BoxFuture<'_, ()>;
}

/// Opens socket sessions
pub trait Connector: Send + 'static {
    fn connect<'a>(&'a mut self, url: &'a str) -> BoxFuture<'a, Result<Box<dyn Socket>>>;
}

/// The real transport: `tokio-tungstenite` over TCP
#[derive(Clone, Copy, Debug, Default)]
pub struct TungsteniteConnector;

struct TungsteniteSocket {
    ws: tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
}

impl Connector for TungsteniteConnector {
    fn connect<'a>(&'a mut self, url: &'a str) -> BoxFuture<'a, Result<Box<dyn Socket>>> {
        Box::pin(async move {
            let (ws, _) = tokio_tungstenite::connect_async(url)
                .await
                .map_err(|e| TrackerError::Transport(e.to_string()))?;
            Ok(Box::new(TungsteniteSocket { ws }) as Box<dyn Socket>)
        })
    }
}

impl Socket for TungsteniteSocket {
    fn next_frame(&mut self) -> BoxFuture<'_, Option<Result<Inbound>>> {
        use futures_util::StreamExt;
        use tokio_tungstenite::tungstenite::Message;

        Box::pin(async move {
            let msg = self.ws.next().await?;
            Some(
                msg.map(|msg| match msg {
                    Message::Text(text) => Inbound::Text(text.to_string()),
                    Message::Close(frame) => Inbound::Close(frame.map(|f| f.reason.to_string())),
                    _ => Inbound::Other,
                })
                .map_err(|e| TrackerError::Transport(e.to_string())),
            )
        })
    }

    fn close(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            if let Err(e) = self.ws.close(None).await {
                debug!(error = %e, "Close after error failed");
            }
        })
    }
}

#[derive(Debug)]
enum Command {
    /// Drop the current socket and open a new one right away
    Reconnect,
    Shutdown,
}

/// How a socket session ended
enum SessionEnd {
    Closed(Option<String>),
    Failed(TrackerError),
    Replaced,
    Shutdown,
}

/// Native tracker client
///
/// Owns the connection task. Dropping the client stops the task.
pub struct TrackerClient<S> {
    handle: TrackerHandle<S>,
    commands: mpsc::UnboundedSender<Command>,
    task: Option<JoinHandle<()>>,
}

impl<S> TrackerClient<S>
where
    S: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Connect to `config.endpoint` over a real WebSocket.
    pub fn connect(config: TrackerConfig<S>) -> Self {
        Self::connect_with(config, TungsteniteConnector)
    }

    /// Connect using a custom transport.
    ///
    /// Runs on the current tokio runtime. Without one, spawns a background
    /// thread with its own runtime.
    pub fn connect_with<C: Connector>(config: TrackerConfig<S>, connector: C) -> Self {
        let state = Arc::new(TrackerState::new(
            config.default_stats.clone(),
            config.ruleset,
        ));
        let handle = TrackerHandle::new(Arc::clone(&state));
        let (tx, rx) = mpsc::unbounded_channel();

        let task = match tokio::runtime::Handle::try_current() {
            Ok(rt) => Some(rt.spawn(run_connection(config, connector, state, rx))),
            Err(_) => {
                std::thread::spawn(move || {
                    let rt = match tokio::runtime::Runtime::new() {
                        Ok(rt) => rt,
                        Err(e) => {
                            error!(error = %e, "Failed to create tokio runtime");
                            return;
                        }
                    };
                    rt.block_on(run_connection(config, connector, state, rx));
                });
                None
            }
        };

        Self {
            handle,
            commands: tx,
            task,
        }
    }

    /// Read-only view for the UI layer
    pub fn handle(&self) -> TrackerHandle<S> {
        self.handle.clone()
    }

    /// Replace the tracked socket with a fresh one.
    ///
    /// Does not check whether the current socket is healthy.
    pub fn reconnect(&self) -> Result<()> {
        self.commands
            .send(Command::Reconnect)
            .map_err(|_| TrackerError::Closed)
    }

    /// Stop the loop and wait for it to close the socket.
    pub async fn shutdown(mut self) {
        if self.commands.send(Command::Shutdown).is_err() {
            debug!("Tracker connection task already stopped");
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Tracker connection task ended abnormally");
            }
        }
    }
}

async fn run_connection<S, C>(
    config: TrackerConfig<S>,
    mut connector: C,
    state: Arc<TrackerState<S>>,
    mut commands: mpsc::UnboundedReceiver<Command>,
) where
    S: DeserializeOwned + Clone,
    C: Connector,
{
    let url = config.endpoint.as_str();
    let mut attempt: u64 = 0;

    loop {
        attempt += 1;
        state.mark_connecting();
        info!(url, attempt, "Connecting to tracker");

        let opened = tokio::select! {
            res = connector.connect(url) => Some(res),
            cmd = commands.recv() => match cmd {
                Some(Command::Reconnect) => None,
                Some(Command::Shutdown) | None => break,
            },
        };

        let retry = match opened {
            // Reconnect requested while still connecting
            None => false,
            Some(Err(e)) => {
                error!(url, error = %e, "Failed to connect");
                true
            }
            Some(Ok(mut socket)) => {
                debug!(url, "WebSocket open, waiting for payload");
                match drive_session(socket.as_mut(), &state, &mut commands).await {
                    SessionEnd::Closed(reason) => {
                        warn!(reason = reason.as_deref().unwrap_or(""), "Tracker server went away");
                        true
                    }
                    SessionEnd::Failed(e) => {
                        error!(error = %e, "WebSocket error, closing socket");
                        socket.close().await;
                        true
                    }
                    SessionEnd::Replaced => {
                        info!("Replacing tracker socket");
                        socket.close().await;
                        false
                    }
                    SessionEnd::Shutdown => {
                        socket.close().await;
                        break;
                    }
                }
            }
        };

        state.mark_disconnected();
        if !retry {
            continue;
        }

        debug!(delay_ms = config.retry_delay.as_millis() as u64, "Scheduling reconnect");
        tokio::select! {
            _ = tokio::time::sleep(config.retry_delay) => {}
            cmd = commands.recv() => match cmd {
                Some(Command::Reconnect) => {}
                Some(Command::Shutdown) | None => break,
            },
        }
    }

    state.mark_disconnected();
    info!("Tracker connection stopped");
}

async fn drive_session<S>(
    socket: &mut dyn Socket,
    state: &TrackerState<S>,
    commands: &mut mpsc::UnboundedReceiver<Command>,
) -> SessionEnd
where
    S: DeserializeOwned + Clone,
{
    loop {
        tokio::select! {
            frame = socket.next_frame() => match frame {
                Some(Ok(Inbound::Text(text))) => {
                    if let Err(e) = apply_frame(&text, state) {
                        warn!(error = %e, "Ignoring malformed frame");
                    }
                }
                Some(Ok(Inbound::Close(reason))) => return SessionEnd::Closed(reason),
                Some(Ok(Inbound::Other)) => {}
                Some(Err(e)) => return SessionEnd::Failed(e),
                None => return SessionEnd::Closed(None),
            },
            cmd = commands.recv() => {
                return match cmd {
                    Some(Command::Reconnect) => SessionEnd::Replaced,
                    Some(Command::Shutdown) | None => SessionEnd::Shutdown,
                };
            }
        }
    }
}
