//! Error types for roster synchronization.

use std::fmt;

use thiserror::Error;
use voxroster_types::{PeerId, WireError};

/// Which side of an identity binding was already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindConflict {
    /// The peer already has a presentation handle.
    Peer,
    /// The handle is already associated with another peer.
    Handle,
}

impl fmt::Display for BindConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindConflict::Peer => write!(f, "peer already has a handle"),
            BindConflict::Handle => write!(f, "handle already in use"),
        }
    }
}

/// Errors raised while applying session events.
///
/// Decode and caller errors are recoverable. Registry and bridge violations
/// mean the local roster no longer agrees with the server and are fatal for
/// the session; see [`RosterError::is_fatal`].
#[derive(Debug, Error)]
pub enum RosterError {
    /// The frame could not be turned into an event.
    #[error("malformed message: {0}")]
    MalformedMessage(#[from] WireError),

    /// A join named an id that is already registered.
    #[error("duplicate peer {0}")]
    DuplicatePeer(PeerId),

    /// An identity binding would overwrite an existing association.
    #[error("cannot bind peer {peer_id}: {conflict}")]
    AlreadyBound {
        /// The peer being bound.
        peer_id: PeerId,
        /// Which side collided.
        conflict: BindConflict,
    },

    /// An event referenced a peer that never joined.
    #[error("message for nonexistent peer {0}")]
    UnknownPeer(PeerId),

    /// `start` was called while a session is already underway.
    #[error("session already connecting or connected")]
    AlreadyConnecting,

    /// A previous fatal error left the roster unreconciled.
    #[error("session faulted: {0}")]
    Faulted(String),
}

impl RosterError {
    /// Whether this error means the roster has diverged from the server.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RosterError::DuplicatePeer(_)
                | RosterError::AlreadyBound { .. }
                | RosterError::UnknownPeer(_)
                | RosterError::Faulted(_)
        )
    }
}
