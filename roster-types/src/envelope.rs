//! Envelope - the wire format wrapper for all session messages.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::WireError;

/// Protocol version carried in every envelope.
pub const PROTOCOL_VERSION: u8 = 1;

/// Message type discriminator for envelope routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageType {
    /// A participant joined the session
    ServerJoin = 1,
    /// A participant left the session
    ServerLeave = 2,
    /// Mute flag of a participant changed
    PlayerMute = 3,
    /// Deafen flag of a participant changed
    PlayerDeaf = 4,
    /// A participant was kicked
    PlayerKick = 5,
    /// Client credentials (client to server only)
    ServerAuthenticate = 6,
    /// Server refused the connection
    ServerReject = 7,
    /// Server accepted the connection and assigned our id
    ServerSync = 8,
    /// Encoded voice frame
    Speex = 9,
}

impl TryFrom<u8> for MessageType {
    type Error = WireError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(MessageType::ServerJoin),
            2 => Ok(MessageType::ServerLeave),
            3 => Ok(MessageType::PlayerMute),
            4 => Ok(MessageType::PlayerDeaf),
            5 => Ok(MessageType::PlayerKick),
            6 => Ok(MessageType::ServerAuthenticate),
            7 => Ok(MessageType::ServerReject),
            8 => Ok(MessageType::ServerSync),
            9 => Ok(MessageType::Speex),
            _ => Err(WireError::UnknownMessageType(value)),
        }
    }
}

/// The envelope wraps every protocol message with a version and a type tag.
///
/// The payload is the MessagePack encoding of the body selected by `msg_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Protocol version (currently 1)
    pub version: u8,
    /// Message type discriminator
    pub msg_type: u8,
    /// MessagePack-encoded message body
    pub payload: Vec<u8>,
}

impl Envelope {
    /// Create a new envelope at the current protocol version.
    pub fn new(msg_type: MessageType, payload: Vec<u8>) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            msg_type: msg_type as u8,
            payload,
        }
    }

    /// Serialize to MessagePack bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        rmp_serde::to_vec(self).map_err(WireError::Serialization)
    }

    /// Deserialize from MessagePack bytes.
    ///
    /// Only the outer frame is checked here; see [`Envelope::message_type`]
    /// for tag validation.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        let envelope: Self = from_slice_exact(bytes)?;
        if envelope.version != PROTOCOL_VERSION {
            return Err(WireError::UnsupportedVersion(envelope.version));
        }
        Ok(envelope)
    }

    /// Get the message type as an enum.
    pub fn message_type(&self) -> Result<MessageType, WireError> {
        MessageType::try_from(self.msg_type)
    }
}

/// Decode exactly one MessagePack value that fills all of `bytes`.
pub(crate) fn from_slice_exact<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, WireError> {
    let mut deserializer = rmp_serde::Deserializer::new(bytes);
    let value = T::deserialize(&mut deserializer).map_err(WireError::Deserialization)?;
    let left = deserializer.get_ref().len();
    if left != 0 {
        return Err(WireError::TrailingBytes(left));
    }
    Ok(value)
}
