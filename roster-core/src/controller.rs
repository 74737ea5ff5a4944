//! Session controller - the owner of all roster state.
//!
//! [`SessionController`] owns the session state machine and the
//! [`Dispatcher`] (and through it the registry, the bridge and the
//! presentation collaborator). It is handed explicitly to whoever drives the
//! session; there is no global instance.
//!
//! # Faults
//!
//! A fatal [`RosterError`] (duplicate peer, binding conflict, unknown peer)
//! means the roster no longer matches the server. The controller returns the
//! error, remembers it, and refuses every later event with
//! [`RosterError::Faulted`] until [`disconnect`](SessionController::disconnect)
//! or [`on_disconnected`](SessionController::on_disconnected) wipes the state.

use voxroster_types::{Message, PeerId, PlayerDeaf, PlayerKick, PlayerMute};

use crate::event::decode;
use crate::presentation::Presentation;
use crate::session::{SessionAction, SessionEvent, SessionState};
use crate::{Dispatcher, IdentityBridge, Peer, PeerRegistry, RosterError, RosterEvent};

/// What the presentation needs to enable and check the per-peer actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerSelection {
    /// The selected peer.
    pub peer_id: PeerId,
    /// Current mute flag.
    pub muted: bool,
    /// Current deafen flag.
    pub deafened: bool,
}

/// Owns session state, roster and presentation for one client.
#[derive(Debug)]
pub struct SessionController<P: Presentation> {
    state: SessionState,
    dispatcher: Dispatcher<P>,
    fault: Option<String>,
}

impl<P: Presentation> SessionController<P> {
    /// Create a controller in the Disconnected state.
    pub fn new(presentation: P) -> Self {
        Self {
            state: SessionState::new(),
            dispatcher: Dispatcher::new(presentation),
            fault: None,
        }
    }

    /// Begin a connection attempt.
    pub fn start(&mut self) -> Result<(), RosterError> {
        if !self.state.can_connect() {
            return Err(RosterError::AlreadyConnecting);
        }
        self.transition(SessionEvent::StartRequested);
        Ok(())
    }

    /// The transport is up; we are now waiting for the server's verdict.
    pub fn on_connected(&mut self) {
        if !self.state.is_connecting() {
            tracing::debug!("Transport connected in state {:?}, ignoring", self.state);
            return;
        }
        tracing::info!("Connected to server, awaiting authentication");
        self.transition(SessionEvent::TransportConnected);
    }

    /// Decode and apply one inbound frame.
    ///
    /// A malformed frame is returned as [`RosterError::MalformedMessage`]
    /// and changes nothing.
    pub fn handle_frame(&mut self, bytes: &[u8]) -> Result<(), RosterError> {
        let event = decode(bytes)?;
        self.handle_event(event)
    }

    /// Apply one decoded event.
    pub fn handle_event(&mut self, event: RosterEvent) -> Result<(), RosterError> {
        self.check_fault()?;
        if !self.state.accepts_roster_events() {
            tracing::debug!("Dropping {:?} outside a live session", event);
            return Ok(());
        }

        let local_id = self.state.local_id();
        match self.dispatcher.dispatch(event, local_id) {
            Ok(Some(session_event)) => {
                self.transition(session_event);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => Err(self.escalate(e)),
        }
    }

    /// Update a peer's talking indicator.
    pub fn set_talking(&mut self, peer_id: PeerId, talking: bool) -> Result<(), RosterError> {
        self.check_fault()?;
        if !self.state.accepts_roster_events() {
            return Ok(());
        }
        self.dispatcher
            .set_talking(peer_id, talking)
            .map_err(|e| self.escalate(e))
    }

    /// User-requested disconnect. A no-op when already disconnected.
    pub fn disconnect(&mut self) {
        self.fault = None;
        self.transition(SessionEvent::DisconnectRequested);
    }

    /// The transport went away. `None` means a clean close.
    pub fn on_disconnected(&mut self, reason: Option<String>) {
        self.fault = None;
        self.transition(SessionEvent::TransportLost { reason });
    }

    /// Current session state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The fatal error that stopped event processing, if any.
    pub fn fault(&self) -> Option<&str> {
        self.fault.as_deref()
    }

    /// Read-only view of the registry.
    pub fn registry(&self) -> &PeerRegistry {
        self.dispatcher.registry()
    }

    /// Read-only view of the identity bridge.
    pub fn bridge(&self) -> &IdentityBridge<P::Handle> {
        self.dispatcher.bridge()
    }

    /// The presentation collaborator.
    pub fn presentation(&self) -> &P {
        self.dispatcher.presentation()
    }

    /// Copy of the current roster, ordered by id.
    pub fn snapshot(&self) -> Vec<Peer> {
        self.registry().iter().cloned().collect()
    }

    /// Resolve a presentation handle to the peer behind it.
    pub fn selection(&self, handle: P::Handle) -> Option<PeerSelection> {
        let peer_id = self.bridge().peer_for(handle)?;
        let peer = self.registry().get(peer_id)?;
        Some(PeerSelection {
            peer_id,
            muted: peer.muted,
            deafened: peer.deafened,
        })
    }

    /// Request that the server toggle a peer's mute flag.
    ///
    /// Nothing changes locally until the server echoes the new state.
    pub fn mute_request(&self, peer_id: PeerId) -> Option<Message> {
        let peer = self.registry().get(peer_id)?;
        Some(Message::PlayerMute(PlayerMute {
            peer_id,
            mute: !peer.muted,
        }))
    }

    /// Request that the server toggle a peer's deafen flag.
    pub fn deaf_request(&self, peer_id: PeerId) -> Option<Message> {
        let peer = self.registry().get(peer_id)?;
        Some(Message::PlayerDeaf(PlayerDeaf {
            peer_id,
            deaf: !peer.deafened,
        }))
    }

    /// Request that the server kick a peer.
    pub fn kick_request(&self, peer_id: PeerId, reason: &str) -> Option<Message> {
        self.registry().get(peer_id)?;
        Some(Message::PlayerKick(PlayerKick {
            peer_id,
            reason: reason.to_string(),
        }))
    }

    fn check_fault(&self) -> Result<(), RosterError> {
        match &self.fault {
            Some(cause) => Err(RosterError::Faulted(cause.clone())),
            None => Ok(()),
        }
    }

    fn escalate(&mut self, error: RosterError) -> RosterError {
        if error.is_fatal() {
            tracing::error!("Roster diverged from server: {}", error);
            self.fault = Some(error.to_string());
        }
        error
    }

    fn transition(&mut self, event: SessionEvent) {
        let previous = std::mem::take(&mut self.state);
        let (next, actions) = previous.clone().on_event(event);
        if next != previous {
            tracing::debug!("Session {:?} -> {:?}", previous, next);
        }
        self.state = next;

        for action in actions {
            self.execute(action);
        }

        if matches!(self.state, SessionState::Rejected { .. }) {
            self.transition(SessionEvent::RejectionSurfaced);
        }
    }

    fn execute(&mut self, action: SessionAction) {
        match action {
            SessionAction::ClearRoster => self.dispatcher.teardown(),
            SessionAction::NotifyRejected { reason } => {
                tracing::warn!("Server rejected connection: {}", reason);
                self.dispatcher.presentation_mut().session_rejected(&reason);
            }
            SessionAction::NotifyDisconnected { reason } => {
                match &reason {
                    Some(reason) => tracing::warn!("Server connection failed: {}", reason),
                    None => tracing::info!("Disconnected from server"),
                }
                self.dispatcher
                    .presentation_mut()
                    .session_disconnected(reason.as_deref());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::{Notification, RecordingPresentation, VisualState};

    fn id(n: u32) -> PeerId {
        PeerId::new(n)
    }

    fn join(n: u32, name: &str) -> RosterEvent {
        RosterEvent::Join {
            peer_id: id(n),
            display_name: name.into(),
        }
    }

    fn connecting() -> (SessionController<RecordingPresentation>, RecordingPresentation) {
        let presentation = RecordingPresentation::new();
        let mut controller = SessionController::new(presentation.clone());
        controller.start().unwrap();
        controller.on_connected();
        (controller, presentation)
    }

    fn connected_as(n: u32) -> (SessionController<RecordingPresentation>, RecordingPresentation) {
        let (mut controller, presentation) = connecting();
        controller.handle_event(join(n, "me")).unwrap();
        controller
            .handle_event(RosterEvent::AuthAccepted { peer_id: id(n) })
            .unwrap();
        (controller, presentation)
    }

    // ===========================================
    // Lifecycle
    // ===========================================

    #[test]
    fn start_enters_connecting() {
        let (controller, _) = connecting();
        assert!(controller.state().is_connecting());
    }

    #[test]
    fn double_start_is_recoverable_error() {
        let (mut controller, _) = connecting();

        let err = controller.start().unwrap_err();

        assert!(matches!(err, RosterError::AlreadyConnecting));
        assert!(!err.is_fatal());
        assert!(controller.state().is_connecting());
    }

    #[test]
    fn auth_accepted_connects_with_local_id() {
        let (controller, _) = connected_as(11);
        assert_eq!(controller.state().local_id(), Some(id(11)));
        assert!(controller.state().can_disconnect());
    }

    #[test]
    fn rejection_resets_to_disconnected_with_one_notice() {
        let (mut controller, presentation) = connecting();

        controller
            .handle_event(RosterEvent::AuthRejected {
                reason: "banned".into(),
            })
            .unwrap();

        assert!(controller.state().is_disconnected());
        assert!(controller.registry().is_empty());
        let rejected: Vec<_> = presentation
            .notifications()
            .into_iter()
            .filter(|n| matches!(n, Notification::SessionRejected { .. }))
            .collect();
        assert_eq!(
            rejected,
            vec![Notification::SessionRejected {
                reason: "banned".into()
            }]
        );
    }

    #[test]
    fn disconnect_clears_roster_atomically() {
        let (mut controller, presentation) = connected_as(1);
        controller.handle_event(join(2, "b")).unwrap();
        controller.handle_event(join(3, "c")).unwrap();
        presentation.clear_notifications();

        controller.disconnect();

        assert!(controller.state().is_disconnected());
        assert!(controller.registry().is_empty());
        assert!(controller.bridge().is_empty());
        assert_eq!(presentation.live_rows(), 0);
        assert_eq!(
            presentation.notifications(),
            vec![
                Notification::RosterCleared {
                    released: vec![(id(1), 1), (id(2), 2), (id(3), 3)],
                },
                Notification::SessionDisconnected { reason: None },
            ]
        );
    }

    #[test]
    fn disconnect_when_disconnected_is_silent() {
        let presentation = RecordingPresentation::new();
        let mut controller = SessionController::new(presentation.clone());

        controller.disconnect();
        controller.on_disconnected(Some("late".into()));

        assert!(controller.state().is_disconnected());
        assert!(presentation.notifications().is_empty());
    }

    #[test]
    fn transport_failure_surfaces_reason() {
        let (mut controller, presentation) = connected_as(1);

        controller.on_disconnected(Some("connection reset".into()));

        assert!(controller.state().is_disconnected());
        assert_eq!(
            presentation.notifications().last(),
            Some(&Notification::SessionDisconnected {
                reason: Some("connection reset".into())
            })
        );
    }

    #[test]
    fn self_kick_tears_down_session() {
        let (mut controller, presentation) = connected_as(11);
        controller.handle_event(join(5, "other")).unwrap();

        controller
            .handle_event(RosterEvent::Kicked {
                peer_id: id(11),
                reason: "behave".into(),
            })
            .unwrap();

        assert!(controller.state().is_disconnected());
        assert!(controller.registry().is_empty());
        assert_eq!(presentation.live_rows(), 0);
        assert_eq!(
            presentation.notifications().last(),
            Some(&Notification::SessionDisconnected {
                reason: Some("behave".into())
            })
        );
    }

    #[test]
    fn events_while_disconnected_are_dropped() {
        let presentation = RecordingPresentation::new();
        let mut controller = SessionController::new(presentation.clone());

        controller.handle_event(join(1, "ghost")).unwrap();

        assert!(controller.registry().is_empty());
        assert!(presentation.notifications().is_empty());
    }

    // ===========================================
    // Faults
    // ===========================================

    #[test]
    fn unknown_peer_faults_session() {
        let (mut controller, _) = connected_as(1);
        controller.handle_event(join(2, "b")).unwrap();

        let err = controller
            .handle_event(RosterEvent::MuteChanged {
                peer_id: id(9),
                muted: true,
            })
            .unwrap_err();

        assert!(matches!(err, RosterError::UnknownPeer(peer) if peer == id(9)));
        assert!(controller.fault().is_some());
        assert!(!controller.registry().get(id(2)).unwrap().muted);

        // Further events are refused, even valid ones
        let err = controller
            .handle_event(RosterEvent::MuteChanged {
                peer_id: id(2),
                muted: true,
            })
            .unwrap_err();
        assert!(matches!(err, RosterError::Faulted(_)));
        assert!(!controller.registry().get(id(2)).unwrap().muted);
    }

    #[test]
    fn disconnect_recovers_from_fault() {
        let (mut controller, _) = connected_as(1);
        let _ = controller.handle_event(RosterEvent::Leave { peer_id: id(9) });
        assert!(controller.fault().is_some());

        controller.disconnect();

        assert!(controller.fault().is_none());
        assert!(controller.registry().is_empty());
        controller.start().unwrap();
        controller.handle_event(join(1, "me")).unwrap();
    }

    #[test]
    fn malformed_frame_is_not_a_fault() {
        let (mut controller, _) = connected_as(1);

        let err = controller.handle_frame(b"\xc1garbage").unwrap_err();

        assert!(matches!(err, RosterError::MalformedMessage(_)));
        assert!(controller.fault().is_none());
        assert_eq!(controller.registry().len(), 1);
    }

    #[test]
    fn handle_frame_applies_decoded_event() {
        let (mut controller, _) = connected_as(1);
        let bytes = Message::ServerJoin(voxroster_types::ServerJoin {
            peer_id: id(4),
            name: "Dora".into(),
        })
        .to_bytes()
        .unwrap();

        controller.handle_frame(&bytes).unwrap();

        assert_eq!(controller.registry().get(id(4)).unwrap().display_name, "Dora");
    }

    // ===========================================
    // Selection and Outbound Requests
    // ===========================================

    #[test]
    fn selection_resolves_handle() {
        let (mut controller, presentation) = connected_as(1);
        controller.handle_event(join(2, "b")).unwrap();
        controller
            .handle_event(RosterEvent::MuteChanged {
                peer_id: id(2),
                muted: true,
            })
            .unwrap();
        let handle = presentation.handle_of(id(2)).unwrap();

        assert_eq!(
            controller.selection(handle),
            Some(PeerSelection {
                peer_id: id(2),
                muted: true,
                deafened: false,
            })
        );
        assert_eq!(controller.selection(999), None);
        assert_eq!(presentation.row(handle).unwrap().visual, VisualState::MuteOnly);
    }

    #[test]
    fn mute_request_toggles_current_flag() {
        let (mut controller, _) = connected_as(1);
        controller.handle_event(join(2, "b")).unwrap();

        assert_eq!(
            controller.mute_request(id(2)),
            Some(Message::PlayerMute(PlayerMute {
                peer_id: id(2),
                mute: true,
            }))
        );

        controller
            .handle_event(RosterEvent::MuteChanged {
                peer_id: id(2),
                muted: true,
            })
            .unwrap();
        assert_eq!(
            controller.mute_request(id(2)),
            Some(Message::PlayerMute(PlayerMute {
                peer_id: id(2),
                mute: false,
            }))
        );
    }

    #[test]
    fn requests_for_unknown_peer_are_none() {
        let (controller, _) = connected_as(1);
        assert_eq!(controller.mute_request(id(8)), None);
        assert_eq!(controller.deaf_request(id(8)), None);
        assert_eq!(controller.kick_request(id(8), "x"), None);
        assert!(controller.fault().is_none());
    }

    #[test]
    fn kick_request_carries_reason() {
        let (controller, _) = connected_as(1);
        assert_eq!(
            controller.kick_request(id(1), "testing"),
            Some(Message::PlayerKick(PlayerKick {
                peer_id: id(1),
                reason: "testing".into(),
            }))
        );
    }

    #[test]
    fn snapshot_is_a_copy() {
        let (mut controller, _) = connected_as(1);
        controller.handle_event(join(2, "b")).unwrap();

        let mut snapshot = controller.snapshot();
        snapshot[0].muted = true;

        assert_eq!(snapshot.len(), 2);
        assert!(!controller.registry().get(id(1)).unwrap().muted);
    }
}
