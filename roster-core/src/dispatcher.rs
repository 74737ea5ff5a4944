//! Event dispatcher for voxroster.
//!
//! The dispatcher is the only code that mutates the [`PeerRegistry`] and the
//! [`IdentityBridge`]. Each call applies one event completely (registry,
//! bridge, presentation) before returning. Lifecycle consequences such as
//! authentication or being kicked are handed back as a [`SessionEvent`] for
//! the controller to run through the session state machine.

use voxroster_types::PeerId;

use crate::presentation::Presentation;
use crate::{IdentityBridge, PeerRegistry, RosterError, RosterEvent, SessionEvent};

/// Applies roster events to the registry, bridge and presentation.
#[derive(Debug)]
pub struct Dispatcher<P: Presentation> {
    registry: PeerRegistry,
    bridge: IdentityBridge<P::Handle>,
    presentation: P,
}

impl<P: Presentation> Dispatcher<P> {
    /// Create a dispatcher with an empty roster.
    pub fn new(presentation: P) -> Self {
        Self {
            registry: PeerRegistry::new(),
            bridge: IdentityBridge::new(),
            presentation,
        }
    }

    /// Apply one event.
    ///
    /// `local_id` is our own id if the server has assigned one; it decides
    /// whether a kick is aimed at us.
    pub fn dispatch(
        &mut self,
        event: RosterEvent,
        local_id: Option<PeerId>,
    ) -> Result<Option<SessionEvent>, RosterError> {
        match event {
            RosterEvent::Join {
                peer_id,
                display_name,
            } => {
                self.join(peer_id, display_name)?;
                Ok(None)
            }
            RosterEvent::Leave { peer_id } => {
                self.leave(peer_id)?;
                Ok(None)
            }
            RosterEvent::MuteChanged { peer_id, muted } => {
                let peer = self.registry.set_mute(peer_id, muted)?;
                let (muted, deafened) = (peer.muted, peer.deafened);
                let handle = self.handle(peer_id)?;
                self.presentation
                    .peer_state_changed(handle, peer_id, muted, deafened);
                Ok(None)
            }
            RosterEvent::DeafenChanged { peer_id, deafened } => {
                let peer = self.registry.set_deaf(peer_id, deafened)?;
                let (muted, deafened) = (peer.muted, peer.deafened);
                let handle = self.handle(peer_id)?;
                self.presentation
                    .peer_state_changed(handle, peer_id, muted, deafened);
                Ok(None)
            }
            RosterEvent::Kicked { peer_id, reason } => {
                self.require(peer_id)?;
                if local_id == Some(peer_id) {
                    tracing::warn!("Kicked from server: {}", reason);
                    Ok(Some(SessionEvent::KickedSelf { reason }))
                } else {
                    tracing::info!("Peer {} kicked: {}", peer_id, reason);
                    self.presentation.peer_kicked(peer_id, &reason);
                    Ok(None)
                }
            }
            RosterEvent::AuthAccepted { peer_id } => {
                self.require(peer_id)?;
                Ok(Some(SessionEvent::AuthAccepted { local_id: peer_id }))
            }
            RosterEvent::AuthRejected { reason } => {
                Ok(Some(SessionEvent::AuthRejected { reason }))
            }
            RosterEvent::VoicePayload {
                peer_id,
                audio_bytes,
            } => {
                tracing::trace!(
                    "Voice frame from {} ({} bytes) left to audio",
                    peer_id,
                    audio_bytes.len()
                );
                Ok(None)
            }
        }
    }

    /// Update the talking indicator for a peer.
    pub fn set_talking(&mut self, peer_id: PeerId, talking: bool) -> Result<(), RosterError> {
        self.registry.set_talking(peer_id, talking)?;
        let handle = self.handle(peer_id)?;
        self.presentation.talking_changed(handle, peer_id, talking);
        Ok(())
    }

    /// Empty the registry and bridge and release every handle in one call.
    pub fn teardown(&mut self) {
        let released = self.bridge.drain();
        self.registry.clear();
        tracing::debug!("Roster cleared ({} handles released)", released.len());
        self.presentation.roster_cleared(released);
    }

    /// Read-only view of the registry.
    pub fn registry(&self) -> &PeerRegistry {
        &self.registry
    }

    /// Read-only view of the bridge.
    pub fn bridge(&self) -> &IdentityBridge<P::Handle> {
        &self.bridge
    }

    /// The presentation collaborator.
    pub fn presentation(&self) -> &P {
        &self.presentation
    }

    /// Mutable access to the presentation collaborator.
    pub fn presentation_mut(&mut self) -> &mut P {
        &mut self.presentation
    }

    fn join(&mut self, peer_id: PeerId, display_name: String) -> Result<(), RosterError> {
        // Refuse before the presentation allocates anything.
        if self.registry.contains(peer_id) {
            return Err(RosterError::DuplicatePeer(peer_id));
        }
        if self.bridge.handle_for(peer_id).is_some() {
            return Err(RosterError::AlreadyBound {
                peer_id,
                conflict: crate::BindConflict::Peer,
            });
        }

        let handle = self.presentation.peer_joined(peer_id, &display_name);
        self.registry.add(peer_id, display_name)?;
        if let Err(e) = self.bridge.bind(peer_id, handle) {
            self.registry.remove(peer_id);
            return Err(e);
        }

        tracing::debug!("Peer {} joined as {:?}", peer_id, handle);
        Ok(())
    }

    fn leave(&mut self, peer_id: PeerId) -> Result<(), RosterError> {
        self.require(peer_id)?;
        let handle = self.bridge.unbind_by_peer(peer_id);
        let peer = self
            .registry
            .remove(peer_id)
            .ok_or(RosterError::UnknownPeer(peer_id))?;

        match handle {
            Some(handle) => self.presentation.peer_left(&peer, handle),
            None => tracing::error!("Peer {} left without a bound handle", peer_id),
        }
        tracing::debug!("Peer {} ({}) left", peer_id, peer.display_name);
        Ok(())
    }

    fn require(&self, peer_id: PeerId) -> Result<(), RosterError> {
        if self.registry.contains(peer_id) {
            Ok(())
        } else {
            Err(RosterError::UnknownPeer(peer_id))
        }
    }

    fn handle(&self, peer_id: PeerId) -> Result<P::Handle, RosterError> {
        self.bridge
            .handle_for(peer_id)
            .ok_or(RosterError::UnknownPeer(peer_id))
    }
}
