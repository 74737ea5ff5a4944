//! Recording presentation for testing.
//!
//! Records every notification and keeps a model of the rows it has handed
//! out, so tests can check both what was said and what is left on screen.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use voxroster_types::PeerId;

use super::{Presentation, VisualState};
use crate::Peer;

/// A notification received by [`RecordingPresentation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Row created.
    PeerJoined {
        /// Peer the row is for.
        peer_id: PeerId,
        /// Name shown in the row.
        display_name: String,
        /// Handle handed back to the core.
        handle: u64,
    },
    /// Row released.
    PeerLeft {
        /// Departed peer.
        peer_id: PeerId,
        /// Released handle.
        handle: u64,
    },
    /// Row recolored.
    PeerStateChanged {
        /// Updated peer.
        peer_id: PeerId,
        /// Its row.
        handle: u64,
        /// New visual state.
        visual: VisualState,
    },
    /// Talking indicator toggled.
    TalkingChanged {
        /// Updated peer.
        peer_id: PeerId,
        /// Its row.
        handle: u64,
        /// New value.
        talking: bool,
    },
    /// Another peer was kicked.
    PeerKicked {
        /// Kicked peer.
        peer_id: PeerId,
        /// Reason.
        reason: String,
    },
    /// All rows released at once.
    RosterCleared {
        /// Every released (peer, handle) pair.
        released: Vec<(PeerId, u64)>,
    },
    /// Connection refused.
    SessionRejected {
        /// Reason.
        reason: String,
    },
    /// Session ended.
    SessionDisconnected {
        /// Reason, if any.
        reason: Option<String>,
    },
}

/// A row currently shown by [`RecordingPresentation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Peer the row belongs to.
    pub peer_id: PeerId,
    /// Name shown.
    pub display_name: String,
    /// Current coloring.
    pub visual: VisualState,
    /// Talking highlight.
    pub talking: bool,
}

/// Presentation double that records everything it is told.
///
/// Clones share state, so a test can keep one clone while the session
/// owns the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingPresentation {
    inner: Arc<Mutex<RecordingInner>>,
}

#[derive(Debug, Default)]
struct RecordingInner {
    next_handle: u64,
    forced_handle: Option<u64>,
    rows: BTreeMap<u64, Row>,
    notifications: Vec<Notification>,
}

impl RecordingPresentation {
    /// Create a new recording presentation.
    pub fn new() -> Self {
        Self::default()
    }

    /// All notifications so far, oldest first.
    pub fn notifications(&self) -> Vec<Notification> {
        let inner = self.inner.lock().unwrap();
        inner.notifications.clone()
    }

    /// Drop the recorded notifications (rows are kept).
    pub fn clear_notifications(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.notifications.clear();
    }

    /// Number of rows currently shown.
    pub fn live_rows(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.rows.len()
    }

    /// The row behind `handle`, if it is still shown.
    pub fn row(&self, handle: u64) -> Option<Row> {
        let inner = self.inner.lock().unwrap();
        inner.rows.get(&handle).cloned()
    }

    /// The handle of the row showing `peer_id`, if any.
    pub fn handle_of(&self, peer_id: PeerId) -> Option<u64> {
        let inner = self.inner.lock().unwrap();
        inner
            .rows
            .iter()
            .find(|(_, row)| row.peer_id == peer_id)
            .map(|(handle, _)| *handle)
    }

    /// Make the next `peer_joined` return `handle` instead of a fresh one.
    pub fn force_next_handle(&self, handle: u64) {
        let mut inner = self.inner.lock().unwrap();
        inner.forced_handle = Some(handle);
    }

    fn record(&self, notification: Notification) {
        let mut inner = self.inner.lock().unwrap();
        inner.notifications.push(notification);
    }
}

impl Presentation for RecordingPresentation {
    type Handle = u64;

    fn peer_joined(&mut self, peer_id: PeerId, display_name: &str) -> u64 {
        let mut inner = self.inner.lock().unwrap();
        let handle = match inner.forced_handle.take() {
            Some(handle) => handle,
            None => {
                inner.next_handle += 1;
                inner.next_handle
            }
        };
        inner.rows.entry(handle).or_insert_with(|| Row {
            peer_id,
            display_name: display_name.to_string(),
            visual: VisualState::Normal,
            talking: false,
        });
        inner.notifications.push(Notification::PeerJoined {
            peer_id,
            display_name: display_name.to_string(),
            handle,
        });
        handle
    }

    fn peer_left(&mut self, peer: &Peer, handle: u64) {
        let mut inner = self.inner.lock().unwrap();
        inner.rows.remove(&handle);
        inner.notifications.push(Notification::PeerLeft {
            peer_id: peer.id,
            handle,
        });
    }

    fn peer_state_changed(&mut self, handle: u64, peer_id: PeerId, muted: bool, deafened: bool) {
        let visual = VisualState::from_flags(muted, deafened);
        let mut inner = self.inner.lock().unwrap();
        if let Some(row) = inner.rows.get_mut(&handle) {
            row.visual = visual;
        }
        inner.notifications.push(Notification::PeerStateChanged {
            peer_id,
            handle,
            visual,
        });
    }

    fn talking_changed(&mut self, handle: u64, peer_id: PeerId, talking: bool) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(row) = inner.rows.get_mut(&handle) {
            row.talking = talking;
        }
        inner.notifications.push(Notification::TalkingChanged {
            peer_id,
            handle,
            talking,
        });
    }

    fn peer_kicked(&mut self, peer_id: PeerId, reason: &str) {
        self.record(Notification::PeerKicked {
            peer_id,
            reason: reason.to_string(),
        });
    }

    fn roster_cleared(&mut self, released: Vec<(PeerId, u64)>) {
        let mut inner = self.inner.lock().unwrap();
        for (_, handle) in &released {
            inner.rows.remove(handle);
        }
        inner
            .notifications
            .push(Notification::RosterCleared { released });
    }

    fn session_rejected(&mut self, reason: &str) {
        self.record(Notification::SessionRejected {
            reason: reason.to_string(),
        });
    }

    fn session_disconnected(&mut self, reason: Option<&str>) {
        self.record(Notification::SessionDisconnected {
            reason: reason.map(str::to_string),
        });
    }
}
