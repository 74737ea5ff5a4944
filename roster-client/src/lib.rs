//! # roster-client
//!
//! Async client runtime for the voxroster voice session protocol.
//!
//! This crate wires a [`Transport`] to a
//! [`SessionController`](voxroster_core::SessionController) and keeps every
//! roster mutation on a single ordered queue.
//!
//! ## Features
//!
//! - **Ordered Event Queue**: one reader task, one consumer, bounded tokio mpsc
//! - **Transport Abstraction**: pluggable transport layer (mock for tests)
//! - **TOML Configuration**: server address, credentials and runtime tuning
//! - **Pure Session Logic**: all roster rules live in `roster-core`
//!
//! ## Example
//!
//! ```ignore
//! use voxroster_client::{logging, ClientConfig, VoiceClient};
//!
//! let config = ClientConfig::load(Path::new("voxroster.toml"))?;
//! logging::init(&config);
//!
//! let mut client = VoiceClient::new(config, transport, presentation);
//! let handle = client.handle();
//! client.run().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod logging;
pub mod transport;

pub use client::{ClientError, ClientHandle, Command, Input, VoiceClient, VoiceFrame};
pub use config::{ClientConfig, ConfigError, RuntimeConfig, ServerConfig, UserConfig};
pub use transport::{MockTransport, Transport, TransportError};
