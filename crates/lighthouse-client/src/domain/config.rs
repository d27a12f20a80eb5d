//! Client configuration types.
//!
//! [`ClientConfig`] holds everything needed to open a session: the server URL
//! and the user's credentials.  Populating it from the environment is the
//! binary's job, not the library's.

use lighthouse_core::Authentication;

/// The public Lighthouse endpoint.
pub const DEFAULT_URL: &str = "wss://lighthouse.uni-kiel.de/websocket";

/// Runtime configuration for a Lighthouse client.
///
/// # Example
///
/// ```rust
/// use lighthouse_client::domain::config::{ClientConfig, DEFAULT_URL};
/// use lighthouse_core::Authentication;
///
/// let cfg = ClientConfig::new(Authentication::new("alice", "token"));
/// assert_eq!(cfg.url, DEFAULT_URL);
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket URL of the server (`ws://` or `wss://`).
    pub url: String,

    /// Credentials attached to every request.
    pub authentication: Authentication,
}

impl ClientConfig {
    /// Creates a configuration for the public endpoint.
    pub fn new(authentication: Authentication) -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            authentication,
        }
    }

    /// Builder-style override of the server URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

impl Default for ClientConfig {
    /// The public endpoint with empty credentials.
    fn default() -> Self {
        Self::new(Authentication::default())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_url_is_public_endpoint() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.url, "wss://lighthouse.uni-kiel.de/websocket");
        assert!(cfg.authentication.username.is_empty());
    }

    #[test]
    fn test_with_url_overrides_endpoint() {
        // Arrange
        let cfg = ClientConfig::new(Authentication::new("alice", "t"));

        // Act
        let cfg = cfg.with_url("ws://127.0.0.1:9000");

        // Assert
        assert_eq!(cfg.url, "ws://127.0.0.1:9000");
        assert_eq!(cfg.authentication.username, "alice");
    }
}
