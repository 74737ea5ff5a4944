//! Peer registry for voxroster.
//!
//! The registry is the authoritative set of participants in the current
//! session, keyed by [`PeerId`]. Every mutator that names a peer fails with
//! [`RosterError::UnknownPeer`] when the peer is absent: the server orders
//! joins before any other event about a peer, so a miss here is a protocol
//! violation rather than a condition to paper over.

use std::collections::BTreeMap;
use voxroster_types::PeerId;

use crate::presentation::VisualState;
use crate::RosterError;

/// One remote session participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    /// Server-assigned identifier.
    pub id: PeerId,
    /// Display name from the join.
    pub display_name: String,
    /// Muted by the server or an administrator.
    pub muted: bool,
    /// Deafened by the server or an administrator.
    pub deafened: bool,
    /// Currently transmitting voice.
    pub talking: bool,
}

impl Peer {
    fn new(id: PeerId, display_name: String) -> Self {
        Self {
            id,
            display_name,
            muted: false,
            deafened: false,
            talking: false,
        }
    }

    /// How the presentation should render this peer.
    pub fn visual_state(&self) -> VisualState {
        VisualState::from_flags(self.muted, self.deafened)
    }
}

/// Registered peers, keyed by id.
#[derive(Debug, Default)]
pub struct PeerRegistry {
    peers: BTreeMap<PeerId, Peer>,
}

impl PeerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new peer.
    pub fn add(&mut self, id: PeerId, display_name: impl Into<String>) -> Result<&Peer, RosterError> {
        use std::collections::btree_map::Entry;

        match self.peers.entry(id) {
            Entry::Occupied(_) => Err(RosterError::DuplicatePeer(id)),
            Entry::Vacant(slot) => Ok(slot.insert(Peer::new(id, display_name.into()))),
        }
    }

    /// Look up a peer.
    pub fn get(&self, id: PeerId) -> Option<&Peer> {
        self.peers.get(&id)
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: PeerId) -> bool {
        self.peers.contains_key(&id)
    }

    /// Remove a peer and return its final state.
    pub fn remove(&mut self, id: PeerId) -> Option<Peer> {
        self.peers.remove(&id)
    }

    /// Set the mute flag.
    pub fn set_mute(&mut self, id: PeerId, value: bool) -> Result<&Peer, RosterError> {
        let peer = self.get_mut(id)?;
        peer.muted = value;
        Ok(peer)
    }

    /// Set the deafen flag.
    pub fn set_deaf(&mut self, id: PeerId, value: bool) -> Result<&Peer, RosterError> {
        let peer = self.get_mut(id)?;
        peer.deafened = value;
        Ok(peer)
    }

    /// Set the talking flag.
    pub fn set_talking(&mut self, id: PeerId, value: bool) -> Result<&Peer, RosterError> {
        let peer = self.get_mut(id)?;
        peer.talking = value;
        Ok(peer)
    }

    /// Number of registered peers.
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// Whether no peers are registered.
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Iterate over peers in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Peer> {
        self.peers.values()
    }

    /// Remove every peer.
    pub fn clear(&mut self) {
        self.peers.clear();
    }

    fn get_mut(&mut self, id: PeerId) -> Result<&mut Peer, RosterError> {
        self.peers.get_mut(&id).ok_or(RosterError::UnknownPeer(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u32) -> PeerId {
        PeerId::new(n)
    }

    // ===========================================
    // Add / Get / Remove
    // ===========================================

    #[test]
    fn new_registry_is_empty() {
        let registry = PeerRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn add_registers_peer_with_cleared_flags() {
        let mut registry = PeerRegistry::new();
        let peer = registry.add(id(7), "Alice").unwrap();

        assert_eq!(peer.id, id(7));
        assert_eq!(peer.display_name, "Alice");
        assert!(!peer.muted && !peer.deafened && !peer.talking);
        assert!(registry.contains(id(7)));
    }

    #[test]
    fn duplicate_add_fails_and_keeps_original() {
        let mut registry = PeerRegistry::new();
        registry.add(id(7), "Alice").unwrap();

        let result = registry.add(id(7), "Mallory");
        assert!(matches!(result, Err(RosterError::DuplicatePeer(p)) if p == id(7)));
        assert_eq!(registry.get(id(7)).unwrap().display_name, "Alice");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn remove_returns_final_state() {
        let mut registry = PeerRegistry::new();
        registry.add(id(1), "Bob").unwrap();
        registry.set_mute(id(1), true).unwrap();

        let peer = registry.remove(id(1)).unwrap();
        assert!(peer.muted);
        assert!(registry.get(id(1)).is_none());
        assert!(registry.remove(id(1)).is_none());
    }

    #[test]
    fn iter_is_ordered_by_id() {
        let mut registry = PeerRegistry::new();
        registry.add(id(30), "c").unwrap();
        registry.add(id(10), "a").unwrap();
        registry.add(id(20), "b").unwrap();

        let ids: Vec<_> = registry.iter().map(|p| p.id.value()).collect();
        assert_eq!(ids, vec![10, 20, 30]);
    }

    // ===========================================
    // Flag Setters
    // ===========================================

    #[test]
    fn setters_mutate_in_place() {
        let mut registry = PeerRegistry::new();
        registry.add(id(5), "Eve").unwrap();

        registry.set_mute(id(5), true).unwrap();
        registry.set_deaf(id(5), true).unwrap();
        registry.set_talking(id(5), true).unwrap();

        let peer = registry.get(id(5)).unwrap();
        assert!(peer.muted && peer.deafened && peer.talking);
    }

    #[test]
    fn mute_twice_is_idempotent() {
        let mut registry = PeerRegistry::new();
        registry.add(id(5), "Eve").unwrap();

        registry.set_mute(id(5), true).unwrap();
        registry.set_mute(id(5), true).unwrap();

        assert!(registry.get(id(5)).unwrap().muted);
    }

    #[test]
    fn setters_on_unknown_peer_fail() {
        let mut registry = PeerRegistry::new();
        registry.add(id(1), "Bob").unwrap();

        assert!(matches!(
            registry.set_mute(id(2), true),
            Err(RosterError::UnknownPeer(p)) if p == id(2)
        ));
        assert!(matches!(
            registry.set_deaf(id(2), true),
            Err(RosterError::UnknownPeer(_))
        ));
        assert!(matches!(
            registry.set_talking(id(2), true),
            Err(RosterError::UnknownPeer(_))
        ));

        // Bystander untouched
        let bob = registry.get(id(1)).unwrap();
        assert!(!bob.muted && !bob.deafened && !bob.talking);
    }

    #[test]
    fn visual_state_follows_flags() {
        let mut registry = PeerRegistry::new();
        registry.add(id(1), "Bob").unwrap();
        assert_eq!(registry.get(id(1)).unwrap().visual_state(), VisualState::Normal);

        let peer = registry.set_deaf(id(1), true).unwrap();
        assert_eq!(peer.visual_state(), VisualState::DeafOnly);
    }

    #[test]
    fn clear_empties_registry() {
        let mut registry = PeerRegistry::new();
        registry.add(id(1), "a").unwrap();
        registry.add(id(2), "b").unwrap();

        registry.clear();
        assert!(registry.is_empty());
    }
}
