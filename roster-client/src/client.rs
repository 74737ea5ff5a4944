//! VoiceClient - the async runtime around a [`SessionController`].
//!
//! # Architecture
//!
//! One reader task pulls frames off the transport, decodes them and pushes
//! them onto a bounded queue. The `run()` future is the only consumer: it
//! owns the controller and applies queued inputs strictly one at a time.
//! [`ClientHandle`]s feed talking changes and user commands into the same
//! queue, so every roster mutation happens in arrival order.
//!
//! ```text
//! Transport → reader task ─┐
//!                          ├→ mpsc queue → run() → SessionController → Presentation
//! ClientHandle (any task) ─┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use voxroster_client::{ClientConfig, MockTransport, VoiceClient};
//! use voxroster_core::RecordingPresentation;
//!
//! let config = ClientConfig::new("voice.example.org:64738", "alice");
//! let mut client = VoiceClient::new(config, MockTransport::new(), RecordingPresentation::new());
//! let handle = client.handle();
//!
//! // Elsewhere: handle.toggle_mute(peer).await?;
//! client.run().await?;
//! ```

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use voxroster_core::{decode, Presentation, RosterError, RosterEvent, SessionController};
use voxroster_types::{Message, PeerId, ServerAuthenticate, WireError, PROTOCOL_VERSION};

use crate::config::ClientConfig;
use crate::transport::{Transport, TransportError};

/// Bytes of a dropped frame shown in the log.
const DUMP_PREFIX: usize = 16;

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Outbound message could not be encoded.
    #[error("serialization error: {0}")]
    Wire(#[from] WireError),

    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The session refused the request.
    #[error("session error: {0}")]
    Session(#[from] RosterError),

    /// The roster diverged from the server; the session was torn down.
    #[error("session fault: {0}")]
    Fatal(#[source] RosterError),

    /// The client behind this handle is gone.
    #[error("client is not running")]
    Closed,
}

/// One input to the session consumer.
#[derive(Debug)]
pub enum Input {
    /// Decoded server event.
    Event(RosterEvent),
    /// Talking indicator from the audio side.
    Talking {
        /// Peer whose indicator changed.
        peer_id: PeerId,
        /// New value.
        talking: bool,
    },
    /// User command.
    Command(Command),
    /// Transport went away. `None` means a clean close.
    Disconnected {
        /// Failure description.
        reason: Option<String>,
    },
}

/// User actions carried through the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Ask the server to flip a peer's mute flag.
    ToggleMute(PeerId),
    /// Ask the server to flip a peer's deafen flag.
    ToggleDeaf(PeerId),
    /// Ask the server to kick a peer.
    Kick {
        /// Target.
        peer_id: PeerId,
        /// Reason shown to everyone.
        reason: String,
    },
    /// End the session.
    Disconnect,
}

/// A voice frame handed to the audio sink.
#[derive(Clone, PartialEq, Eq)]
pub struct VoiceFrame {
    /// Speaking peer.
    pub peer_id: PeerId,
    /// Encoded audio.
    pub audio: Vec<u8>,
}

impl std::fmt::Debug for VoiceFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceFrame")
            .field("peer_id", &self.peer_id)
            .field("audio", &format!("[{} bytes]", self.audio.len()))
            .finish()
    }
}

/// Cloneable sender for talking changes and user commands.
///
/// Usable from any task; inputs are applied in the order they are queued.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    tx: mpsc::Sender<Input>,
}

impl ClientHandle {
    /// Report a talking change for `peer_id`.
    pub async fn talking(&self, peer_id: PeerId, talking: bool) -> Result<(), ClientError> {
        self.send(Input::Talking { peer_id, talking }).await
    }

    /// Request a mute toggle for `peer_id`.
    pub async fn toggle_mute(&self, peer_id: PeerId) -> Result<(), ClientError> {
        self.send(Input::Command(Command::ToggleMute(peer_id))).await
    }

    /// Request a deafen toggle for `peer_id`.
    pub async fn toggle_deaf(&self, peer_id: PeerId) -> Result<(), ClientError> {
        self.send(Input::Command(Command::ToggleDeaf(peer_id))).await
    }

    /// Request that `peer_id` be kicked.
    pub async fn kick(&self, peer_id: PeerId, reason: &str) -> Result<(), ClientError> {
        self.send(Input::Command(Command::Kick {
            peer_id,
            reason: reason.to_string(),
        }))
        .await
    }

    /// End the session.
    pub async fn disconnect(&self) -> Result<(), ClientError> {
        self.send(Input::Command(Command::Disconnect)).await
    }

    async fn send(&self, input: Input) -> Result<(), ClientError> {
        self.tx.send(input).await.map_err(|_| ClientError::Closed)
    }
}

/// The voice session client.
///
/// Owns the transport, the session controller and the input queue.
pub struct VoiceClient<T: Transport + 'static, P: Presentation> {
    config: ClientConfig,
    transport: Arc<T>,
    controller: SessionController<P>,
    tx: mpsc::Sender<Input>,
    rx: mpsc::Receiver<Input>,
    audio: Option<mpsc::Sender<VoiceFrame>>,
}

impl<T: Transport + 'static, P: Presentation> VoiceClient<T, P> {
    /// Create a new VoiceClient.
    pub fn new(config: ClientConfig, transport: T, presentation: P) -> Self {
        let (tx, rx) = mpsc::channel(config.client.queue_capacity.max(1));
        Self {
            config,
            transport: Arc::new(transport),
            controller: SessionController::new(presentation),
            tx,
            rx,
            audio: None,
        }
    }

    /// Forward voice frames to `sink`.
    ///
    /// Frames are dropped, not queued, when the sink is full.
    pub fn with_audio_sink(mut self, sink: mpsc::Sender<VoiceFrame>) -> Self {
        self.audio = Some(sink);
        self
    }

    /// A handle for feeding inputs from other tasks.
    pub fn handle(&self) -> ClientHandle {
        ClientHandle {
            tx: self.tx.clone(),
        }
    }

    /// The session controller.
    pub fn controller(&self) -> &SessionController<P> {
        &self.controller
    }

    /// Get the transport (for testing).
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Connect, authenticate and process inputs until the session ends.
    ///
    /// Returns `Ok(())` once the session is back to disconnected, whatever
    /// the reason. A fatal roster error closes the transport, tears the
    /// session down and is returned as [`ClientError::Fatal`].
    pub async fn run(&mut self) -> Result<(), ClientError> {
        // Leftovers from a previous session
        while self.rx.try_recv().is_ok() {}

        self.controller.start()?;

        let address = self.config.server.address.clone();
        tracing::info!("Connecting to {}", address);
        if let Err(e) = self.transport.connect(&address).await {
            let reason = e.to_string();
            self.controller.on_disconnected(Some(reason.clone()));
            return Err(ClientError::ConnectionFailed(reason));
        }
        self.controller.on_connected();

        if let Err(e) = self.authenticate().await {
            self.shutdown().await;
            self.controller.on_disconnected(Some(e.to_string()));
            return Err(e);
        }

        let reader = tokio::spawn(read_frames(Arc::clone(&self.transport), self.tx.clone()));
        let result = self.consume().await;
        reader.abort();
        result
    }

    async fn authenticate(&self) -> Result<(), ClientError> {
        let auth = Message::ServerAuthenticate(ServerAuthenticate {
            username: self.config.user.username.clone(),
            password: self.config.user.password.clone(),
            version: PROTOCOL_VERSION,
        });
        tracing::debug!("Authenticating as {}", self.config.user.username);
        self.send(&auth).await
    }

    async fn consume(&mut self) -> Result<(), ClientError> {
        while let Some(input) = self.rx.recv().await {
            if let Err(e) = self.apply(input).await {
                if e.is_fatal() {
                    tracing::error!("Session fault, closing connection: {}", e);
                    self.shutdown().await;
                    self.controller.on_disconnected(Some(e.to_string()));
                    return Err(ClientError::Fatal(e));
                }
                tracing::warn!("Input rejected: {}", e);
            }

            if self.controller.state().is_disconnected() {
                self.shutdown().await;
                return Ok(());
            }
        }
        Ok(())
    }

    async fn apply(&mut self, input: Input) -> Result<(), RosterError> {
        match input {
            Input::Event(RosterEvent::VoicePayload {
                peer_id,
                audio_bytes,
            }) => {
                self.forward_voice(peer_id, audio_bytes);
                Ok(())
            }
            Input::Event(event) => self.controller.handle_event(event),
            Input::Talking { peer_id, talking } => {
                // The audio side may lag behind a Leave
                if !self.controller.registry().contains(peer_id) {
                    tracing::debug!("Talking change for departed peer {}, dropping", peer_id);
                    return Ok(());
                }
                self.controller.set_talking(peer_id, talking)
            }
            Input::Command(command) => {
                self.execute(command).await;
                Ok(())
            }
            Input::Disconnected { reason } => {
                self.controller.on_disconnected(reason);
                Ok(())
            }
        }
    }

    async fn execute(&mut self, command: Command) {
        let request = match command {
            Command::ToggleMute(peer_id) => self.controller.mute_request(peer_id),
            Command::ToggleDeaf(peer_id) => self.controller.deaf_request(peer_id),
            Command::Kick { peer_id, reason } => self.controller.kick_request(peer_id, &reason),
            Command::Disconnect => {
                self.controller.disconnect();
                return;
            }
        };

        let Some(message) = request else {
            tracing::debug!("Ignoring request for a peer that is not on the roster");
            return;
        };
        if let Err(e) = self.send(&message).await {
            tracing::warn!("Failed to send {:?}: {}", message.message_type(), e);
            self.controller.on_disconnected(Some(e.to_string()));
        }
    }

    fn forward_voice(&mut self, peer_id: PeerId, audio: Vec<u8>) {
        if !self.controller.state().accepts_roster_events() {
            return;
        }
        let Some(sink) = &self.audio else {
            tracing::trace!("No audio sink, dropping frame from {}", peer_id);
            return;
        };
        match sink.try_send(VoiceFrame { peer_id, audio }) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::trace!("Audio sink full, dropping frame from {}", peer_id);
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("Audio sink closed");
                self.audio = None;
            }
        }
    }

    async fn send(&self, message: &Message) -> Result<(), ClientError> {
        let bytes = message.to_bytes()?;
        self.transport.send(&bytes).await?;
        Ok(())
    }

    async fn shutdown(&self) {
        if let Err(e) = self.transport.close().await {
            tracing::debug!("Transport close failed: {}", e);
        }
    }
}

/// Reader task: decode frames and queue them until the transport ends.
async fn read_frames<T: Transport>(transport: Arc<T>, tx: mpsc::Sender<Input>) {
    loop {
        let bytes = match transport.recv().await {
            Ok(bytes) => bytes,
            Err(e) => {
                let reason = match e {
                    TransportError::ConnectionClosed => None,
                    other => Some(other.to_string()),
                };
                tracing::info!("Receive loop ended: {}", reason.as_deref().unwrap_or("closed"));
                let _ = tx.send(Input::Disconnected { reason }).await;
                return;
            }
        };

        match decode(&bytes) {
            Ok(event) => {
                if tx.send(Input::Event(event)).await.is_err() {
                    return;
                }
            }
            Err(e) => {
                let prefix = &bytes[..bytes.len().min(DUMP_PREFIX)];
                tracing::warn!(
                    "Dropping malformed frame ({} bytes, starts {}): {}",
                    bytes.len(),
                    hex::encode(prefix),
                    e
                );
            }
        }
    }
}
