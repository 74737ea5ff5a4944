//! Presentation collaborator interface.
//!
//! The presentation layer renders the roster (one row per peer) and owns the
//! handles for those rows. The core never looks inside a handle; it asks for
//! one on join, hands it back on leave, and names it on every update so the
//! presentation can find the row without keeping its own index.

mod recording;

pub use recording::{Notification, RecordingPresentation, Row};

use std::fmt::Debug;
use std::hash::Hash;

use voxroster_types::PeerId;

use crate::Peer;

/// How a peer should be drawn, derived from its mute and deafen flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualState {
    /// Muted and deafened.
    Both,
    /// Muted only.
    MuteOnly,
    /// Deafened only.
    DeafOnly,
    /// Neither flag set.
    Normal,
}

impl VisualState {
    /// Map the two flags onto one of the four states.
    pub fn from_flags(muted: bool, deafened: bool) -> Self {
        match (muted, deafened) {
            (true, true) => VisualState::Both,
            (true, false) => VisualState::MuteOnly,
            (false, true) => VisualState::DeafOnly,
            (false, false) => VisualState::Normal,
        }
    }
}

/// Receiver of roster change notifications.
///
/// Calls arrive from the single consumer that applies session events, one
/// event's worth at a time.
pub trait Presentation {
    /// Opaque per-row resource owned by the presentation.
    type Handle: Copy + Eq + Hash + Debug;

    /// A peer joined; create its row and return the handle for it.
    fn peer_joined(&mut self, peer_id: PeerId, display_name: &str) -> Self::Handle;

    /// A peer left; release its row.
    fn peer_left(&mut self, peer: &Peer, handle: Self::Handle);

    /// Mute or deafen flags changed.
    fn peer_state_changed(
        &mut self,
        handle: Self::Handle,
        peer_id: PeerId,
        muted: bool,
        deafened: bool,
    );

    /// Talking indicator changed.
    fn talking_changed(&mut self, handle: Self::Handle, peer_id: PeerId, talking: bool);

    /// Another peer was kicked. Informational only.
    fn peer_kicked(&mut self, _peer_id: PeerId, _reason: &str) {}

    /// The whole roster was torn down; release every listed row.
    fn roster_cleared(&mut self, released: Vec<(PeerId, Self::Handle)>);

    /// The server refused the connection.
    fn session_rejected(&mut self, reason: &str);

    /// The session ended. `None` means a clean, user-requested disconnect.
    fn session_disconnected(&mut self, reason: Option<&str>);
}
