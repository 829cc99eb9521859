use crate::infrastructure::{ReconnectPolicy, ReconnectTimer, TaskManager, http_to_ws_endpoint};
use crate::types::{PushFrame, Result};
use crate::websocket::{PushStream, WebSocketFactory};
use futures::stream::StreamExt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// Lifecycle of the push channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

impl ConnectionState {
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

pub type StatusCallback = Arc<dyn Fn(ConnectionState) + Send + Sync + 'static>;

/// Shared between the manager and its supervisor task.
///
/// `generation` is bumped by every `open()`/`close()`; a supervisor whose generation
/// no longer matches may not report anything.
struct Link {
    state: ConnectionState,
    generation: u64,
    frames: Option<mpsc::UnboundedSender<PushFrame>>,
    on_status: Option<StatusCallback>,
}

/// Owns the push channel, its reconnect timer and the task driving both.
///
/// The socket never leaves the supervisor task, so no other component can hold it.
pub struct ConnectionManager {
    endpoint: String,
    policy: ReconnectPolicy,
    link: Arc<Mutex<Link>>,
    tasks: tokio::sync::Mutex<TaskManager>,
}

impl ConnectionManager {
    /// Manager for an explicit push endpoint (`ws://` or `wss://`)
    pub fn new(endpoint: impl Into<String>, policy: ReconnectPolicy) -> Self {
        Self {
            endpoint: endpoint.into(),
            policy,
            link: Arc::new(Mutex::new(Link {
                state: ConnectionState::Disconnected,
                generation: 0,
                frames: None,
                on_status: None,
            })),
            tasks: tokio::sync::Mutex::new(TaskManager::new()),
        }
    }

    /// Manager for the push endpoint derived from the service base address
    pub fn for_service(base_url: &str, policy: ReconnectPolicy) -> Result<Self> {
        Ok(Self::new(http_to_ws_endpoint(base_url)?, policy))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Gets the current connection state
    pub fn state(&self) -> ConnectionState {
        lock(&self.link).state
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_live()
    }

    /// Opens the push channel, tearing down any existing one first.
    ///
    /// Status changes are reported to `on_status` as they happen. Decoded frames arrive
    /// on the returned receiver in arrival order. The channel reconnects on its own
    /// until [`close()`](Self::close) is called.
    pub async fn open<F>(&self, on_status: F) -> mpsc::UnboundedReceiver<PushFrame>
    where
        F: Fn(ConnectionState) + Send + Sync + 'static,
    {
        self.close().await;

        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let generation = {
            let mut link = lock(&self.link);
            link.generation += 1;
            link.frames = Some(frames_tx);
            link.on_status = Some(Arc::new(on_status));
            link.generation
        };

        let supervisor = Supervisor {
            endpoint: self.endpoint.clone(),
            link: Arc::clone(&self.link),
            generation,
        };
        let policy = self.policy.clone();

        tracing::info!("Opening push channel to {}", self.endpoint);
        self.tasks
            .lock()
            .await
            .spawn(async move { supervisor.run(ReconnectTimer::new(policy)).await });

        frames_rx
    }

    /// Closes the push channel and stops reconnecting.
    ///
    /// Cancels any pending reconnect wait, then drops the socket. No status callback
    /// and no frame is delivered once this returns.
    pub async fn close(&self) {
        let on_status = {
            let mut link = lock(&self.link);
            link.generation += 1;
            link.frames = None;
            link.state = ConnectionState::Disconnected;
            link.on_status.take()
        };

        // Aborting the supervisor cancels its timer and drops the socket it owns
        self.tasks.lock().await.shutdown().await;

        if let Some(on_status) = on_status {
            tracing::info!("Push channel to {} closed", self.endpoint);
            on_status(ConnectionState::Disconnected);
        }
    }
}

/// Longest slice of a malformed frame that gets logged
const LOG_PREVIEW_CHARS: usize = 120;

fn preview(raw: &str) -> &str {
    match raw.char_indices().nth(LOG_PREVIEW_CHARS) {
        Some((end, _)) => &raw[..end],
        None => raw,
    }
}

fn lock(link: &Mutex<Link>) -> MutexGuard<'_, Link> {
    // A panicking status callback must not wedge the manager
    link.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct Supervisor {
    endpoint: String,
    link: Arc<Mutex<Link>>,
    generation: u64,
}

impl Supervisor {
    async fn run(self, mut timer: ReconnectTimer) {
        loop {
            if !self.transition(ConnectionState::Connecting) {
                return;
            }

            match WebSocketFactory::create(&self.endpoint).await {
                Ok(stream) => {
                    if !self.transition(ConnectionState::Connected) {
                        return;
                    }
                    tracing::info!("Push channel connected to {}", self.endpoint);
                    timer.reset();
                    if !self.pump(stream).await {
                        return;
                    }
                }
                Err(e) => {
                    tracing::warn!("Push channel connection to {} failed: {}", self.endpoint, e);
                }
            }

            if !self.transition(ConnectionState::Reconnecting) {
                return;
            }
            tracing::info!("Push channel lost, scheduling reconnect");
            timer.schedule_timeout().await;
        }
    }

    /// Reads frames until the channel drops. Returns false if this supervisor was retired.
    async fn pump(&self, mut stream: PushStream) -> bool {
        while let Some(msg_result) = stream.next().await {
            match msg_result {
                Ok(Message::Text(text)) => {
                    let raw = text.as_str();
                    match PushFrame::decode(raw) {
                        Ok(Some(frame)) => {
                            tracing::debug!("Received {} frame", frame.kind());
                            if !self.deliver(frame) {
                                return false;
                            }
                        }
                        Ok(None) => {}
                        Err(e) => {
                            tracing::warn!(
                                "Dropping malformed push frame ({} bytes): {} - Raw: {}",
                                raw.len(),
                                e,
                                preview(raw)
                            );
                        }
                    }
                }
                Ok(Message::Close(frame)) => {
                    if let Some(close_frame) = frame {
                        tracing::warn!(
                            "Server closed push channel: code={:?}, reason='{}'",
                            close_frame.code,
                            close_frame.reason
                        );
                    } else {
                        tracing::warn!("Server closed push channel without close frame");
                    }
                    break;
                }
                Ok(Message::Ping(data)) => {
                    tracing::debug!("Received ping ({} bytes)", data.len());
                }
                Ok(Message::Pong(data)) => {
                    tracing::debug!("Received pong ({} bytes)", data.len());
                }
                Ok(Message::Binary(data)) => {
                    tracing::warn!("Dropping unexpected binary frame ({} bytes)", data.len());
                }
                Ok(Message::Frame(_)) => {
                    tracing::debug!("Received raw frame (internal)");
                }
                Err(e) => {
                    tracing::error!("Push channel read error: {}", e);
                    break;
                }
            }
        }
        true
    }

    fn transition(&self, new_state: ConnectionState) -> bool {
        let on_status = {
            let mut link = lock(&self.link);
            if link.generation != self.generation {
                return false;
            }
            link.state = new_state;
            link.on_status.clone()
        };

        if let Some(on_status) = on_status {
            on_status(new_state);
        }
        true
    }

    fn deliver(&self, frame: PushFrame) -> bool {
        let link = lock(&self.link);
        if link.generation != self.generation {
            return false;
        }
        match &link.frames {
            Some(frames) => {
                if frames.send(frame).is_err() {
                    tracing::debug!("Push frame receiver dropped, frame discarded");
                }
                true
            }
            None => false,
        }
    }
}
