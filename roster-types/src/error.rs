//! Error types for the voxroster wire format.

use thiserror::Error;

use crate::MessageType;

/// Errors that can occur while encoding or decoding frames.
#[derive(Debug, Error)]
pub enum WireError {
    /// MessagePack serialization failed
    #[error("serialization failed: {0}")]
    Serialization(#[source] rmp_serde::encode::Error),

    /// MessagePack deserialization failed
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] rmp_serde::decode::Error),

    /// Bytes left over after a complete value
    #[error("{0} trailing bytes after message")]
    TrailingBytes(usize),

    /// Unrecognized message type discriminator
    #[error("unknown message type: {0}")]
    UnknownMessageType(u8),

    /// Frame was produced by an incompatible protocol version
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    /// A well-formed message that is never sent in this direction
    #[error("unexpected {0:?} message")]
    UnexpectedMessage(MessageType),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = WireError::UnknownMessageType(99);
        assert_eq!(err.to_string(), "unknown message type: 99");

        let err = WireError::UnexpectedMessage(MessageType::ServerAuthenticate);
        assert_eq!(err.to_string(), "unexpected ServerAuthenticate message");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<WireError>();
    }
}
