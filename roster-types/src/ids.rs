//! Identity types for voxroster.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A server-assigned identifier for one session participant.
///
/// Unique for the lifetime of the session and never reused while the
/// participant is registered.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeerId(u32);

impl PeerId {
    /// Create a PeerId from its numeric value.
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Get the numeric value of this PeerId.
    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl From<u32> for PeerId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerId({})", self.0)
    }
}
