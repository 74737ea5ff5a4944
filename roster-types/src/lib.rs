//! # roster-types
//!
//! Wire format types for the voxroster voice session protocol.
//!
//! This crate provides the foundational types used across all voxroster crates:
//! - [`PeerId`] - Server-assigned participant identity
//! - [`Envelope`] - Frame wrapper with version and type discriminator
//! - [`Message`] - Protocol messages (ServerJoin, PlayerMute, ServerSync, etc.)
//! - [`WireError`] - Encoding and decoding errors

#![warn(missing_docs)]
#![warn(clippy::all)]

mod envelope;
mod error;
mod ids;
mod messages;

pub use envelope::{Envelope, PROTOCOL_VERSION};
pub use error::WireError;
pub use ids::PeerId;
pub use messages::{
    Message, MessageType, PlayerDeaf, PlayerKick, PlayerMute, ServerAuthenticate, ServerJoin,
    ServerLeave, ServerReject, ServerSync, Speex,
};
