//! Server configuration and its TOML file format.
//!
//! Every field has a serde default, so an empty file (or no file at all) gives
//! a working local server:
//!
//! ```toml
//! bind_addr = "127.0.0.1:8080"
//!
//! [policy]
//! rename_on_every_request = true
//! stop_disables_streaming = false
//! ```
//!
//! The binary applies `--bind` / `--port` on top of whatever the file says.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::session::SessionPolicy;

/// Port the server listens on when none is configured.
pub const DEFAULT_PORT: u16 = 8080;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// All runtime configuration for the server.
///
/// # Example
///
/// ```rust
/// use lighthouse_server::domain::config::{ServerConfig, DEFAULT_PORT};
///
/// let cfg = ServerConfig::default();
/// assert_eq!(cfg.bind_addr.port(), DEFAULT_PORT);
/// assert!(cfg.policy.rename_on_every_request);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// Behaviour of every client session.
    #[serde(default)]
    pub policy: SessionPolicy,
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_PORT)
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            policy: SessionPolicy::default(),
        }
    }
}

impl ServerConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text is not valid TOML or a
    /// field has the wrong type.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if its content is invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}
