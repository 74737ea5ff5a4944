//! Message decoding into roster events.
//!
//! [`decode`] turns one inbound frame into exactly one [`RosterEvent`] or a
//! [`RosterError::MalformedMessage`]. It touches no other state, so a bad
//! frame can be dropped without consequences for the roster.

use voxroster_types::{Message, MessageType, PeerId, WireError};

use crate::RosterError;

/// A decoded server-to-client event.
///
/// This is a closed set: the dispatcher matches it exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterEvent {
    /// A participant joined.
    Join {
        /// New participant.
        peer_id: PeerId,
        /// Display name.
        display_name: String,
    },
    /// A participant left.
    Leave {
        /// Departing participant.
        peer_id: PeerId,
    },
    /// Mute flag changed.
    MuteChanged {
        /// Target participant.
        peer_id: PeerId,
        /// New value.
        muted: bool,
    },
    /// Deafen flag changed.
    DeafenChanged {
        /// Target participant.
        peer_id: PeerId,
        /// New value.
        deafened: bool,
    },
    /// A participant was kicked.
    Kicked {
        /// Kicked participant (possibly us).
        peer_id: PeerId,
        /// Reason given by the kicker.
        reason: String,
    },
    /// The server accepted us and assigned our id.
    AuthAccepted {
        /// Our own id for the rest of the session.
        peer_id: PeerId,
    },
    /// The server refused us.
    AuthRejected {
        /// Reason shown to the user.
        reason: String,
    },
    /// Voice data; no roster effect, routed to the audio subsystem.
    VoicePayload {
        /// Speaking participant.
        peer_id: PeerId,
        /// Codec frame.
        audio_bytes: Vec<u8>,
    },
}

impl RosterEvent {
    /// The peer this event refers to, if any.
    pub fn peer_id(&self) -> Option<PeerId> {
        match self {
            RosterEvent::Join { peer_id, .. }
            | RosterEvent::Leave { peer_id }
            | RosterEvent::MuteChanged { peer_id, .. }
            | RosterEvent::DeafenChanged { peer_id, .. }
            | RosterEvent::Kicked { peer_id, .. }
            | RosterEvent::AuthAccepted { peer_id }
            | RosterEvent::VoicePayload { peer_id, .. } => Some(*peer_id),
            RosterEvent::AuthRejected { .. } => None,
        }
    }
}

impl TryFrom<Message> for RosterEvent {
    type Error = WireError;

    fn try_from(message: Message) -> Result<Self, Self::Error> {
        let event = match message {
            Message::ServerJoin(m) => RosterEvent::Join {
                peer_id: m.peer_id,
                display_name: m.name,
            },
            Message::ServerLeave(m) => RosterEvent::Leave { peer_id: m.peer_id },
            Message::PlayerMute(m) => RosterEvent::MuteChanged {
                peer_id: m.peer_id,
                muted: m.mute,
            },
            Message::PlayerDeaf(m) => RosterEvent::DeafenChanged {
                peer_id: m.peer_id,
                deafened: m.deaf,
            },
            Message::PlayerKick(m) => RosterEvent::Kicked {
                peer_id: m.peer_id,
                reason: m.reason,
            },
            Message::ServerSync(m) => RosterEvent::AuthAccepted { peer_id: m.peer_id },
            Message::ServerReject(m) => RosterEvent::AuthRejected { reason: m.reason },
            Message::Speex(m) => RosterEvent::VoicePayload {
                peer_id: m.peer_id,
                audio_bytes: m.frame,
            },
            Message::ServerAuthenticate(_) => {
                return Err(WireError::UnexpectedMessage(MessageType::ServerAuthenticate))
            }
        };
        Ok(event)
    }
}

/// Decode one inbound frame.
pub fn decode(bytes: &[u8]) -> Result<RosterEvent, RosterError> {
    let message = Message::from_bytes(bytes)?;
    Ok(RosterEvent::try_from(message)?)
}
