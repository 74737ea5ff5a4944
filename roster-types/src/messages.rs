//! Protocol messages for voxroster.
//!
//! Each message body is MessagePack-encoded and carried as the payload of
//! an [`Envelope`](crate::Envelope) tagged with its [`MessageType`].

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{Envelope, PeerId, WireError};

// Re-export MessageType from envelope for convenience
pub use crate::envelope::MessageType;

/// All possible protocol messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Participant joined
    ServerJoin(ServerJoin),
    /// Participant left
    ServerLeave(ServerLeave),
    /// Mute flag changed (or mute request when sent by us)
    PlayerMute(PlayerMute),
    /// Deafen flag changed (or deafen request when sent by us)
    PlayerDeaf(PlayerDeaf),
    /// Participant kicked (or kick request when sent by us)
    PlayerKick(PlayerKick),
    /// Client credentials
    ServerAuthenticate(ServerAuthenticate),
    /// Connection refused
    ServerReject(ServerReject),
    /// Connection accepted, carries our own id
    ServerSync(ServerSync),
    /// Voice frame
    Speex(Speex),
}

impl Message {
    /// The type tag this message is framed with.
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::ServerJoin(_) => MessageType::ServerJoin,
            Message::ServerLeave(_) => MessageType::ServerLeave,
            Message::PlayerMute(_) => MessageType::PlayerMute,
            Message::PlayerDeaf(_) => MessageType::PlayerDeaf,
            Message::PlayerKick(_) => MessageType::PlayerKick,
            Message::ServerAuthenticate(_) => MessageType::ServerAuthenticate,
            Message::ServerReject(_) => MessageType::ServerReject,
            Message::ServerSync(_) => MessageType::ServerSync,
            Message::Speex(_) => MessageType::Speex,
        }
    }

    /// Serialize to a framed MessagePack envelope.
    pub fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        let payload = match self {
            Message::ServerJoin(m) => encode_body(m)?,
            Message::ServerLeave(m) => encode_body(m)?,
            Message::PlayerMute(m) => encode_body(m)?,
            Message::PlayerDeaf(m) => encode_body(m)?,
            Message::PlayerKick(m) => encode_body(m)?,
            Message::ServerAuthenticate(m) => encode_body(m)?,
            Message::ServerReject(m) => encode_body(m)?,
            Message::ServerSync(m) => encode_body(m)?,
            Message::Speex(m) => encode_body(m)?,
        };
        Envelope::new(self.message_type(), payload).to_bytes()
    }

    /// Deserialize from a framed MessagePack envelope.
    ///
    /// Fails on an unsupported version, an unknown tag, or a payload that
    /// does not decode as the body the tag names.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        let envelope = Envelope::from_bytes(bytes)?;
        let payload = &envelope.payload;
        let message = match envelope.message_type()? {
            MessageType::ServerJoin => Message::ServerJoin(decode_body(payload)?),
            MessageType::ServerLeave => Message::ServerLeave(decode_body(payload)?),
            MessageType::PlayerMute => Message::PlayerMute(decode_body(payload)?),
            MessageType::PlayerDeaf => Message::PlayerDeaf(decode_body(payload)?),
            MessageType::PlayerKick => Message::PlayerKick(decode_body(payload)?),
            MessageType::ServerAuthenticate => {
                Message::ServerAuthenticate(decode_body(payload)?)
            }
            MessageType::ServerReject => Message::ServerReject(decode_body(payload)?),
            MessageType::ServerSync => Message::ServerSync(decode_body(payload)?),
            MessageType::Speex => Message::Speex(decode_body(payload)?),
        };
        Ok(message)
    }
}

fn encode_body<T: Serialize>(body: &T) -> Result<Vec<u8>, WireError> {
    rmp_serde::to_vec(body).map_err(WireError::Serialization)
}

fn decode_body<T: DeserializeOwned>(payload: &[u8]) -> Result<T, WireError> {
    crate::envelope::from_slice_exact(payload)
}

/// A participant joined the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerJoin {
    /// Server-assigned id of the new participant
    pub peer_id: PeerId,
    /// Display name
    pub name: String,
}

/// A participant left the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerLeave {
    /// Id of the departing participant
    pub peer_id: PeerId,
}

/// Mute flag of a participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerMute {
    /// Target participant
    pub peer_id: PeerId,
    /// New mute flag
    pub mute: bool,
}

/// Deafen flag of a participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerDeaf {
    /// Target participant
    pub peer_id: PeerId,
    /// New deafen flag
    pub deaf: bool,
}

/// A participant was removed by an administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerKick {
    /// Kicked participant
    pub peer_id: PeerId,
    /// Free-form reason given by the kicker
    pub reason: String,
}

/// Credentials sent by the client once the transport is up.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerAuthenticate {
    /// Requested display name
    pub username: String,
    /// Server password (may be empty)
    pub password: String,
    /// Client protocol version
    pub version: u8,
}

impl std::fmt::Debug for ServerAuthenticate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerAuthenticate")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("version", &self.version)
            .finish()
    }
}

/// The server refused the connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerReject {
    /// Human-readable reason
    pub reason: String,
}

/// The server accepted the connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSync {
    /// Id the server assigned to this client
    pub peer_id: PeerId,
}

/// An encoded voice frame from one participant.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Speex {
    /// Speaking participant
    pub peer_id: PeerId,
    /// Frame sequence number
    pub seq: u32,
    /// Codec payload
    pub frame: Vec<u8>,
}

impl std::fmt::Debug for Speex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Speex")
            .field("peer_id", &self.peer_id)
            .field("seq", &self.seq)
            .field("frame", &format!("[{} bytes]", self.frame.len()))
            .finish()
    }
}
