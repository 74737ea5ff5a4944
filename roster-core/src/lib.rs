//! # roster-core
//!
//! Pure session logic for voxroster (no I/O, instant tests).
//!
//! This crate keeps a voice-chat client's view of who is on the server in
//! step with the server's own view. It decodes inbound frames into
//! [`RosterEvent`]s, applies them to the [`PeerRegistry`], keeps the
//! [`IdentityBridge`] between peer ids and presentation handles consistent,
//! and tells a [`Presentation`] collaborator what changed.
//!
//! ## Design Philosophy
//!
//! Nothing in this crate touches a socket or a thread. The
//! [`SessionController`] owns all state and is driven by one caller at a
//! time; `roster-client` supplies the transport and the queue that
//! serializes events into it.
//!
//! - [`SessionState`] is a pure state machine producing [`SessionAction`]s
//! - [`Dispatcher`] is the only writer of the registry and the bridge
//! - [`RecordingPresentation`] records notifications for tests

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bridge;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod presentation;
pub mod registry;
pub mod session;

pub use bridge::IdentityBridge;
pub use controller::{PeerSelection, SessionController};
pub use dispatcher::Dispatcher;
pub use error::{BindConflict, RosterError};
pub use event::{decode, RosterEvent};
pub use presentation::{Notification, Presentation, RecordingPresentation, Row, VisualState};
pub use registry::{Peer, PeerRegistry};
pub use session::{SessionAction, SessionEvent, SessionState};
