//! WebSocket server: accept loop and per-connection task management.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured address.
//! 2. Upgrading each accepted connection to a WebSocket.
//! 3. Registering the connection with the [`ConnectionRegistry`].
//! 4. Running two tasks per connection:
//!    - **Reader**: binary frames from the socket → `handle_frame`.
//!    - **Writer**: encoded responses and pushes from the outbound channel →
//!      binary frames on the socket.
//! 5. Unregistering the connection when either side ends.
//! 6. Stopping the accept loop when the `running` flag is cleared.
//!
//! Only binary frames carry requests.  Text frames are logged and ignored;
//! ping/pong is answered by tokio-tungstenite itself.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::{
    accept_async,
    tungstenite::{Error as WsError, Message as WsMessage},
};
use tracing::{debug, error, info, warn};

use crate::application::registry::ConnectionRegistry;
use crate::domain::config::ServerConfig;

/// How long `accept()` may block before the `running` flag is re-checked.
const ACCEPT_POLL: Duration = Duration::from_millis(200);

/// A bound, not yet running, Lighthouse server.
///
/// Binding and running are separate so a caller can bind to port `0` and read
/// the chosen port from [`local_addr`](Self::local_addr) before serving:
///
/// ```no_run
/// # async fn demo() -> anyhow::Result<()> {
/// use std::sync::{atomic::AtomicBool, Arc};
/// use lighthouse_server::{LighthouseServer, ServerConfig};
///
/// let config = ServerConfig { bind_addr: "127.0.0.1:0".parse()?, ..ServerConfig::default() };
/// let server = LighthouseServer::bind(&config).await?;
/// println!("listening on {}", server.local_addr()?);
/// server.run(Arc::new(AtomicBool::new(true))).await?;
/// # Ok(())
/// # }
/// ```
pub struct LighthouseServer {
    listener: TcpListener,
    registry: Arc<ConnectionRegistry>,
}

impl LighthouseServer {
    /// Binds the listener.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound (port in use, missing
    /// permission).
    pub async fn bind(config: &ServerConfig) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(config.bind_addr)
            .await
            .with_context(|| format!("failed to bind WebSocket listener on {}", config.bind_addr))?;
        Ok(Self {
            listener,
            registry: Arc::new(ConnectionRegistry::new(config.policy)),
        })
    }

    /// The address actually bound, useful after binding to port `0`.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// The registry shared by every connection.
    pub fn registry(&self) -> Arc<ConnectionRegistry> {
        Arc::clone(&self.registry)
    }

    /// Accepts connections until `running` is set to `false`.
    ///
    /// Connections already open keep running on their own tasks after the
    /// loop stops.
    pub async fn run(self, running: Arc<AtomicBool>) -> anyhow::Result<()> {
        info!("Lighthouse server listening on {}", self.local_addr()?);

        loop {
            if !running.load(Ordering::Relaxed) {
                info!("shutdown flag set; stopping accept loop");
                break;
            }

            match timeout(ACCEPT_POLL, self.listener.accept()).await {
                Ok(Ok((stream, peer_addr))) => {
                    debug!("new connection from {peer_addr}");
                    let registry = Arc::clone(&self.registry);
                    tokio::spawn(async move {
                        handle_connection(stream, peer_addr, registry).await;
                    });
                }
                Ok(Err(e)) => {
                    // Transient (e.g. out of file descriptors); keep serving.
                    error!("accept error: {e}");
                }
                Err(_) => {
                    // No connection within ACCEPT_POLL; re-check the flag.
                }
            }
        }

        Ok(())
    }
}

// ── Per-connection handler ────────────────────────────────────────────────────

async fn handle_connection(
    raw_stream: TcpStream,
    peer_addr: SocketAddr,
    registry: Arc<ConnectionRegistry>,
) {
    match run_connection(raw_stream, peer_addr, registry).await {
        Ok(()) => debug!("connection {peer_addr} closed normally"),
        Err(e) => warn!("connection {peer_addr} closed with error: {e:#}"),
    }
}

/// Runs the complete lifecycle of one WebSocket connection.
async fn run_connection(
    raw_stream: TcpStream,
    peer_addr: SocketAddr,
    registry: Arc<ConnectionRegistry>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(raw_stream)
        .await
        .with_context(|| format!("WebSocket handshake failed with {peer_addr}"))?;

    let (mut ws_tx, mut ws_rx) = ws_stream.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Vec<u8>>();
    let id = registry.register(outbound_tx);
    info!("connection {id} established from {peer_addr}");

    // ── Writer: outbound channel → socket ─────────────────────────────────────
    let mut writer = tokio::spawn(async move {
        while let Some(bytes) = outbound_rx.recv().await {
            if let Err(e) = ws_tx.send(WsMessage::Binary(bytes)).await {
                debug!("connection {id}: WebSocket send failed: {e}");
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    // ── Reader: socket → registry ─────────────────────────────────────────────
    let reader = async {
        while let Some(frame) = ws_rx.next().await {
            match frame {
                Ok(WsMessage::Binary(bytes)) => {
                    if let Err(e) = registry.handle_frame(id, &bytes) {
                        warn!("connection {id}: dropping frame: {e}");
                    }
                }
                Ok(WsMessage::Text(text)) => {
                    warn!(
                        "connection {id}: unexpected text frame ({} bytes, ignored)",
                        text.len()
                    );
                }
                Ok(WsMessage::Close(_)) => {
                    debug!("connection {id}: Close frame received");
                    break;
                }
                Ok(_) => {
                    // Ping/Pong/raw frames: handled by tungstenite.
                }
                Err(WsError::ConnectionClosed | WsError::Protocol(_)) => {
                    debug!("connection {id}: WebSocket closed");
                    break;
                }
                Err(e) => {
                    warn!("connection {id}: WebSocket error: {e}");
                    break;
                }
            }
        }
    };

    tokio::select! {
        _ = reader => {}
        _ = &mut writer => {
            debug!("connection {id}: writer ended");
        }
    }

    // Dropping the registry entry drops the outbound sender, which ends the
    // writer once it has flushed what is queued.
    registry.unregister(id);
    if !writer.is_finished() {
        let _ = writer.await;
    }
    Ok(())
}

