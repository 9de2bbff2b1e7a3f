//! Client Configuration
//!
//! Environment-driven configuration for the chat client. Everything has a
//! sensible default so the binary runs unconfigured against a local server.

use std::time::Duration;

/// Default chat server address
const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

/// Default per-chunk idle timeout for reply streams, in seconds
///
/// The protocol itself sets no bound on how long a stream may stay silent;
/// this is the client's decision so a stalled stream fails instead of
/// pinning the session in `Streaming` forever.
const DEFAULT_STREAM_IDLE_SECS: u64 = 120;

/// Default TCP connect timeout, in seconds
const DEFAULT_CONNECT_SECS: u64 = 10;

/// Configuration for the chat client
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL of the chat server
    pub server_url: String,
    /// How long a reply stream may stay silent before the read fails
    pub stream_idle_timeout: Duration,
    /// TCP connect timeout for all requests
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            stream_idle_timeout: Duration::from_secs(DEFAULT_STREAM_IDLE_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_SECS),
        }
    }
}

impl ClientConfig {
    /// Build configuration from environment variables
    ///
    /// - `SHELLWAY_SERVER_URL` - chat server base URL
    /// - `SHELLWAY_STREAM_IDLE_SECS` - stream idle timeout in seconds
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let server_url =
            std::env::var("SHELLWAY_SERVER_URL").unwrap_or(defaults.server_url);

        let stream_idle_timeout = std::env::var("SHELLWAY_STREAM_IDLE_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map_or(defaults.stream_idle_timeout, Duration::from_secs);

        Self {
            server_url,
            stream_idle_timeout,
            connect_timeout: defaults.connect_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.server_url, "http://localhost:8000");
        assert_eq!(config.stream_idle_timeout, Duration::from_secs(120));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
    }
}
