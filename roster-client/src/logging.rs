//! `tracing` subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::config::ClientConfig;

/// Install a formatting subscriber for the process.
///
/// `RUST_LOG` wins over `client.log_filter` when set. Returns `false` if a
/// global subscriber was already installed, which makes repeat calls safe.
pub fn init(config: &ClientConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.client.log_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_harmless() {
        let config = ClientConfig::new("127.0.0.1:64738", "alice").with_log_filter("debug");

        let _ = init(&config);
        assert!(!init(&config));
    }
}
