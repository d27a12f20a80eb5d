//! Lighthouse reference server entry point.
//!
//! ```text
//! lighthouse-server --config server.toml --port 9000
//! ```
//!
//! Settings are layered: built-in defaults, then the TOML file given with
//! `--config`, then `--bind` / `--port`.

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use lighthouse_server::{LighthouseServer, ServerConfig};

// ── CLI ───────────────────────────────────────────────────────────────────────

/// Serves the Lighthouse protocol over WebSocket from memory.
#[derive(Debug, Parser)]
#[command(
    name = "lighthouse-server",
    about = "Reference Lighthouse server for local development and tests",
    version
)]
struct Cli {
    /// TOML configuration file.
    #[arg(long, env = "LIGHTHOUSE_SERVER_CONFIG")]
    config: Option<PathBuf>,

    /// IP address to bind to, overriding the config file.
    #[arg(long, env = "LIGHTHOUSE_SERVER_BIND")]
    bind: Option<IpAddr>,

    /// Port to listen on, overriding the config file.
    #[arg(long, env = "LIGHTHOUSE_SERVER_PORT")]
    port: Option<u16>,
}

impl Cli {
    /// Loads the config file (if any) and applies the command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed.
    fn into_server_config(self) -> anyhow::Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => ServerConfig::default(),
        };
        if let Some(ip) = self.bind {
            config.bind_addr.set_ip(ip);
        }
        if let Some(port) = self.port {
            config.bind_addr.set_port(port);
        }
        Ok(config)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_server_config()?;
    info!(
        "Lighthouse server starting on {} ({:?})",
        config.bind_addr, config.policy
    );

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    LighthouseServer::bind(&config).await?.run(running).await?;

    info!("Lighthouse server stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
