//! Session state machine for voxroster.
//!
//! This module provides a pure, side-effect-free state machine for the
//! connection lifecycle. It takes events as input and produces a new state
//! plus a list of actions for the [`SessionController`](crate::SessionController)
//! to carry out against the roster and the presentation layer.

use voxroster_types::PeerId;

/// Session lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No session.
    Disconnected,
    /// Transport coming up or waiting for the server's verdict.
    Connecting,
    /// Accepted by the server.
    Connected {
        /// Id the server assigned to us.
        local_id: PeerId,
    },
    /// Refused by the server; reset to `Disconnected` once surfaced.
    Rejected {
        /// Reason given by the server.
        reason: String,
    },
}

impl SessionState {
    /// Create a new state machine in the Disconnected state.
    pub fn new() -> Self {
        Self::Disconnected
    }

    /// Process an event and return the new state plus actions to execute.
    ///
    /// Transitions that make no sense for the current state leave it
    /// unchanged and produce no actions.
    pub fn on_event(self, event: SessionEvent) -> (Self, Vec<SessionAction>) {
        match (self, event) {
            // From Disconnected
            (Self::Disconnected, SessionEvent::StartRequested) => (Self::Connecting, vec![]),

            // From Connecting
            (Self::Connecting, SessionEvent::TransportConnected) => (Self::Connecting, vec![]),
            (Self::Connecting, SessionEvent::AuthAccepted { local_id }) => {
                (Self::Connected { local_id }, vec![])
            }
            (Self::Connecting, SessionEvent::AuthRejected { reason }) => (
                Self::Rejected {
                    reason: reason.clone(),
                },
                vec![
                    SessionAction::ClearRoster,
                    SessionAction::NotifyRejected { reason },
                ],
            ),

            // From Connected
            (Self::Connected { .. }, SessionEvent::KickedSelf { reason }) => (
                Self::Disconnected,
                vec![
                    SessionAction::ClearRoster,
                    SessionAction::NotifyDisconnected {
                        reason: Some(reason),
                    },
                ],
            ),

            // Teardown from any live state
            (Self::Connecting | Self::Connected { .. }, SessionEvent::DisconnectRequested) => (
                Self::Disconnected,
                vec![
                    SessionAction::ClearRoster,
                    SessionAction::NotifyDisconnected { reason: None },
                ],
            ),
            (Self::Connecting | Self::Connected { .. }, SessionEvent::TransportLost { reason }) => (
                Self::Disconnected,
                vec![
                    SessionAction::ClearRoster,
                    SessionAction::NotifyDisconnected { reason },
                ],
            ),

            // From Rejected
            (
                Self::Rejected { .. },
                SessionEvent::RejectionSurfaced
                | SessionEvent::DisconnectRequested
                | SessionEvent::TransportLost { .. },
            ) => (Self::Disconnected, vec![]),

            // Invalid transitions - stay in current state
            (state, _) => (state, vec![]),
        }
    }

    /// Check if the server has accepted us.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    /// Check if a connection attempt is underway.
    pub fn is_connecting(&self) -> bool {
        matches!(self, Self::Connecting)
    }

    /// Check if there is no session at all.
    pub fn is_disconnected(&self) -> bool {
        matches!(self, Self::Disconnected)
    }

    /// Our own id, once accepted.
    pub fn local_id(&self) -> Option<PeerId> {
        match self {
            Self::Connected { local_id } => Some(*local_id),
            _ => None,
        }
    }

    /// Whether a new connection may be started (connect action enabled).
    pub fn can_connect(&self) -> bool {
        self.is_disconnected()
    }

    /// Whether there is anything to disconnect (disconnect action enabled).
    pub fn can_disconnect(&self) -> bool {
        matches!(self, Self::Connecting | Self::Connected { .. })
    }

    /// Whether roster events should be applied in this state.
    pub fn accepts_roster_events(&self) -> bool {
        matches!(self, Self::Connecting | Self::Connected { .. })
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Events that drive the session lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// User asked to connect.
    StartRequested,
    /// Transport reported that it is up.
    TransportConnected,
    /// Server accepted us.
    AuthAccepted {
        /// Our assigned id.
        local_id: PeerId,
    },
    /// Server refused us.
    AuthRejected {
        /// Reason given by the server.
        reason: String,
    },
    /// We were kicked.
    KickedSelf {
        /// Reason given by the kicker.
        reason: String,
    },
    /// User asked to disconnect.
    DisconnectRequested,
    /// Transport went away.
    TransportLost {
        /// Failure description; `None` for a clean close.
        reason: Option<String>,
    },
    /// The rejection reason has been shown.
    RejectionSurfaced,
}

/// Actions the controller must carry out after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Empty the registry and bridge and release every handle at once.
    ClearRoster,
    /// Tell the presentation the server refused us.
    NotifyRejected {
        /// Reason given by the server.
        reason: String,
    },
    /// Tell the presentation the session ended.
    NotifyDisconnected {
        /// Why, if not a clean disconnect.
        reason: Option<String>,
    },
}
