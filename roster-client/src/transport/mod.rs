//! Transport abstraction for voxroster.
//!
//! This module provides a pluggable transport layer that carries framed
//! protocol messages between the client and the voice server.
//!
//! # Design
//!
//! The transport trait is async and connection-oriented:
//! - `connect()` establishes a connection to the server
//! - `send()` transmits one encoded frame
//! - `recv()` waits for the next inbound frame
//! - `close()` gracefully terminates
//!
//! `send()` and `recv()` may be called concurrently from different tasks;
//! the client's reader task owns the receive side.
//!
//! # Example
//!
//! ```ignore
//! let transport = MockTransport::new();
//! transport.connect("voice.example.org:64738").await?;
//! transport.send(&frame).await?;
//! let reply = transport.recv().await?;
//! ```

mod mock;

pub use mock::MockTransport;

use async_trait::async_trait;
use thiserror::Error;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Not connected.
    #[error("not connected")]
    NotConnected,

    /// Connection closed by the remote side or by `close()`.
    #[error("connection closed")]
    ConnectionClosed,

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),
}

/// Transport trait for exchanging protocol frames with a voice server.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connect to the server at `address`.
    async fn connect(&self, address: &str) -> Result<(), TransportError>;

    /// Send one frame.
    async fn send(&self, data: &[u8]) -> Result<(), TransportError>;

    /// Receive the next frame.
    ///
    /// Waits until a frame is available. A clean close is reported as
    /// [`TransportError::ConnectionClosed`].
    async fn recv(&self) -> Result<Vec<u8>, TransportError>;

    /// Check if currently connected.
    fn is_connected(&self) -> bool;

    /// Close the connection gracefully.
    async fn close(&self) -> Result<(), TransportError>;
}
