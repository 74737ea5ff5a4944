//! Configuration loading for the voxroster client.
//!
//! Configuration is loaded from a TOML file:
//!
//! ```toml
//! [server]
//! address = "voice.example.org:64738"
//!
//! [user]
//! username = "alice"
//! password = "hunter2"
//!
//! [client]
//! queue_capacity = 256
//! log_filter = "info,voxroster_core=debug"
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Root configuration for the client.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Server to connect to.
    pub server: ServerConfig,
    /// Credentials presented on connect.
    pub user: UserConfig,
    /// Client runtime tuning.
    #[serde(default)]
    pub client: RuntimeConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address handed to the transport.
    pub address: String,
}

/// Credentials sent in the authentication message.
#[derive(Clone, Deserialize)]
pub struct UserConfig {
    /// Display name requested from the server.
    pub username: String,
    /// Server password (default: empty).
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for UserConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserConfig")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Client runtime configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    /// Capacity of the session event queue (default: 256).
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// `tracing` filter used when `RUST_LOG` is unset (default: "info").
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

// Default value functions
fn default_queue_capacity() -> usize {
    256
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            log_filter: default_log_filter(),
        }
    }
}

impl ClientConfig {
    /// Create a configuration for `username` on the server at `address`.
    pub fn new(address: &str, username: &str) -> Self {
        Self {
            server: ServerConfig {
                address: address.to_string(),
            },
            user: UserConfig {
                username: username.to_string(),
                password: String::new(),
            },
            client: RuntimeConfig::default(),
        }
    }

    /// Set the server password.
    pub fn with_password(mut self, password: &str) -> Self {
        self.user.password = password.to_string();
        self
    }

    /// Set the event queue capacity.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.client.queue_capacity = capacity;
        self
    }

    /// Set the fallback log filter.
    pub fn with_log_filter(mut self, filter: &str) -> Self {
        self.client.log_filter = filter.to_string();
        self
    }

    /// Load and validate configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails
    /// validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(ConfigError::InvalidToml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that parse but cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.address.trim().is_empty() {
            return Err(ConfigError::Invalid("server.address is empty".into()));
        }
        if self.user.username.trim().is_empty() {
            return Err(ConfigError::Invalid("user.username is empty".into()));
        }
        if self.client.queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "client.queue_capacity must be at least 1".into(),
            ));
        }
        EnvFilter::try_new(&self.client.log_filter).map_err(|e| {
            ConfigError::Invalid(format!(
                "client.log_filter {:?}: {}",
                self.client.log_filter, e
            ))
        })?;
        Ok(())
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// Failed to parse configuration text.
    #[error("failed to parse config: {0}")]
    InvalidToml(#[source] toml::de::Error),
    /// Parsed, but a value is unusable.
    #[error("invalid config: {0}")]
    Invalid(String),
}
