//! Identity bridge between peers and presentation handles.
//!
//! The presentation layer owns one opaque handle per displayed roster row.
//! The bridge keeps `peer -> handle` and `handle -> peer` as a pair and only
//! exposes paired mutations, so neither direction can drift from the other.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use voxroster_types::PeerId;

use crate::{BindConflict, RosterError};

/// Two-way association between peers and presentation handles.
#[derive(Debug)]
pub struct IdentityBridge<H> {
    by_peer: HashMap<PeerId, H>,
    by_handle: HashMap<H, PeerId>,
}

impl<H> Default for IdentityBridge<H> {
    fn default() -> Self {
        Self {
            by_peer: HashMap::new(),
            by_handle: HashMap::new(),
        }
    }
}

impl<H: Copy + Eq + Hash + Debug> IdentityBridge<H> {
    /// Create an empty bridge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `peer_id` with `handle`.
    ///
    /// Fails without changing anything if either side is already bound.
    pub fn bind(&mut self, peer_id: PeerId, handle: H) -> Result<(), RosterError> {
        if self.by_peer.contains_key(&peer_id) {
            return Err(RosterError::AlreadyBound {
                peer_id,
                conflict: BindConflict::Peer,
            });
        }
        if self.by_handle.contains_key(&handle) {
            return Err(RosterError::AlreadyBound {
                peer_id,
                conflict: BindConflict::Handle,
            });
        }

        self.by_peer.insert(peer_id, handle);
        self.by_handle.insert(handle, peer_id);
        self.check_invariant();
        Ok(())
    }

    /// The handle bound to `peer_id`.
    pub fn handle_for(&self, peer_id: PeerId) -> Option<H> {
        self.by_peer.get(&peer_id).copied()
    }

    /// The peer bound to `handle`.
    pub fn peer_for(&self, handle: H) -> Option<PeerId> {
        self.by_handle.get(&handle).copied()
    }

    /// Remove both directions for `peer_id` and return the freed handle.
    pub fn unbind_by_peer(&mut self, peer_id: PeerId) -> Option<H> {
        let handle = self.by_peer.remove(&peer_id)?;
        self.by_handle.remove(&handle);
        self.check_invariant();
        Some(handle)
    }

    /// Remove every association, returning them ordered by peer id.
    pub fn drain(&mut self) -> Vec<(PeerId, H)> {
        let mut released: Vec<_> = self.by_peer.drain().collect();
        self.by_handle.clear();
        released.sort_by_key(|(peer_id, _)| *peer_id);
        released
    }

    /// Number of bound pairs.
    pub fn len(&self) -> usize {
        self.by_peer.len()
    }

    /// Whether nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.by_peer.is_empty()
    }

    /// Whether the two maps are exact inverses of each other.
    pub fn is_consistent(&self) -> bool {
        self.by_peer.len() == self.by_handle.len()
            && self
                .by_peer
                .iter()
                .all(|(peer_id, handle)| self.by_handle.get(handle) == Some(peer_id))
    }

    fn check_invariant(&self) {
        // Conflicts are rejected before insertion.
        debug_assert_eq!(
            self.by_peer.len(),
            self.by_handle.len(),
            "identity bridge maps diverged"
        );
        debug_assert!(self.is_consistent(), "identity bridge maps diverged");
    }
}
