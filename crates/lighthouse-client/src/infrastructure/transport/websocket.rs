//! WebSocket transport built on tokio-tungstenite.
//!
//! # Connection layout
//!
//! ```text
//!                 ┌── SplitSink ──► send()      (guarded by a tokio Mutex)
//! WebSocketStream ┤
//!                 └── SplitStream ─► reader task ─► BinaryHandler(s)
//! ```
//!
//! Only binary frames carry protocol messages.  Text frames are logged and
//! ignored; ping/pong is answered by tungstenite itself.  When the server
//! closes the socket the reader task ends and later sends fail with
//! [`TransportError::SendFailed`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::application::transport::{BinaryHandler, Transport, TransportError};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, WsMessage>;

/// A client WebSocket carrying one protocol message per binary frame.
pub struct WebSocketTransport {
    url: String,
    handlers: Arc<Mutex<Vec<BinaryHandler>>>,
    sink: tokio::sync::Mutex<Option<WsSink>>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl WebSocketTransport {
    /// Creates an unconnected transport for `url` (`ws://` or `wss://`).
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            handlers: Arc::new(Mutex::new(Vec::new())),
            sink: tokio::sync::Mutex::new(None),
            reader: Mutex::new(None),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        if self.url.starts_with("wss:") {
            install_crypto_provider();
        }
        let (ws_stream, response) =
            connect_async(self.url.as_str())
                .await
                .map_err(|e| TransportError::ConnectFailed {
                    url: self.url.clone(),
                    reason: e.to_string(),
                })?;
        info!("WebSocket connected to {} (HTTP {})", self.url, response.status());

        let (sink, stream) = ws_stream.split();
        *self.sink.lock().await = Some(sink);

        let reader = tokio::spawn(read_loop(
            stream,
            Arc::clone(&self.handlers),
            self.url.clone(),
        ));
        if let Some(previous) = lock(&self.reader).replace(reader) {
            previous.abort();
        }
        Ok(())
    }

    async fn send(&self, bytes: Vec<u8>) -> Result<(), TransportError> {
        let mut guard = self.sink.lock().await;
        let sink = guard.as_mut().ok_or(TransportError::NotConnected)?;
        sink.send(WsMessage::Binary(bytes))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    fn on_binary(&self, handler: BinaryHandler) {
        lock(&self.handlers).push(handler);
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        if let Some(reader) = lock(&self.reader).take() {
            reader.abort();
        }
    }
}

/// Makes `ring` the process-wide rustls provider unless one is already set.
fn install_crypto_provider() {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_ok()
    {
        debug!("installed ring as the rustls crypto provider");
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Hands every inbound binary frame to the registered handlers until the
/// socket closes or errors.
async fn read_loop(
    mut stream: SplitStream<WsStream>,
    handlers: Arc<Mutex<Vec<BinaryHandler>>>,
    url: String,
) {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(WsMessage::Binary(bytes)) => {
                // Snapshot so no lock is held while handlers run.
                let snapshot = lock(&handlers).clone();
                for handler in &snapshot {
                    handler(bytes.clone());
                }
            }
            Ok(WsMessage::Text(text)) => {
                debug!("ignoring text frame from {url} ({} bytes)", text.len());
            }
            Ok(WsMessage::Close(reason)) => {
                info!("{url} closed the connection: {reason:?}");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("WebSocket read error on {url}: {e}");
                break;
            }
        }
    }
    debug!("reader for {url} finished");
}

// ── Tests ─────────────────────────────────────────────────────────────────────
