//! In-memory transport for tests.
//!
//! # Why a mock transport?
//!
//! The multiplexer's interesting behaviour (id allocation, out-of-order
//! delivery, stream cancellation) depends on *when* responses arrive relative
//! to requests.  With a real socket that timing belongs to the server; with
//! `MockTransport` the test decides:
//!
//! ```ignore
//! let transport = Arc::new(MockTransport::new());
//! let lh = Lighthouse::new(transport.clone(), auth);
//! lh.connect().await?;
//!
//! let call = tokio::spawn(async move { lh.list(&["user"]).await });
//! let sent = transport.wait_for_sent(1).await;
//! transport.respond(&ServerMessage::ok(sent[0].request_id));
//! ```
//!
//! Inbound frames are handed to the registered handlers synchronously, on the
//! caller's thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use lighthouse_core::{decode_client_message, encode_server_message, ClientMessage, ServerMessage};
use tokio::sync::Notify;
use tracing::warn;

use crate::application::transport::{BinaryHandler, Transport, TransportError};

/// A transport that records outbound frames and injects inbound ones.
#[derive(Default)]
pub struct MockTransport {
    handlers: Mutex<Vec<BinaryHandler>>,
    sent: Mutex<Vec<Vec<u8>>>,
    sent_changed: Notify,
    connected: AtomicBool,
    fail_connect: bool,
    fail_send: AtomicBool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose `connect` always fails.
    pub fn failing_connect() -> Self {
        Self {
            fail_connect: true,
            ..Self::default()
        }
    }

    /// Makes every following `send` fail (or succeed again).
    pub fn set_fail_send(&self, fail: bool) {
        self.fail_send.store(fail, Ordering::SeqCst);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn handler_count(&self) -> usize {
        lock(&self.handlers).len()
    }

    /// Every frame written so far, in order.
    pub fn sent_frames(&self) -> Vec<Vec<u8>> {
        lock(&self.sent).clone()
    }

    /// Every frame written so far, decoded as requests.
    pub fn sent_messages(&self) -> Vec<ClientMessage> {
        lock(&self.sent)
            .iter()
            .filter_map(|bytes| decode_client_message(bytes).ok())
            .collect()
    }

    /// Waits until at least `count` frames have been written and returns them
    /// decoded.
    pub async fn wait_for_sent(&self, count: usize) -> Vec<ClientMessage> {
        loop {
            let changed = self.sent_changed.notified();
            tokio::pin!(changed);
            changed.as_mut().enable();
            if lock(&self.sent).len() >= count {
                return self.sent_messages();
            }
            changed.await;
        }
    }

    /// Delivers raw bytes to every registered handler.
    pub fn inject(&self, bytes: Vec<u8>) {
        let handlers = lock(&self.handlers).clone();
        for handler in &handlers {
            handler(bytes.clone());
        }
    }

    /// Encodes `msg` and delivers it as an inbound frame.
    pub fn respond(&self, msg: &ServerMessage) {
        match encode_server_message(msg) {
            Ok(bytes) => self.inject(bytes),
            Err(e) => warn!("mock transport could not encode response: {e}"),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        if self.fail_connect {
            return Err(TransportError::ConnectFailed {
                url: "mock://".to_string(),
                reason: "injected failure".to_string(),
            });
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn send(&self, bytes: Vec<u8>) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(TransportError::SendFailed("injected failure".to_string()));
        }
        lock(&self.sent).push(bytes);
        self.sent_changed.notify_waiters();
        Ok(())
    }

    fn on_binary(&self, handler: BinaryHandler) {
        lock(&self.handlers).push(handler);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lighthouse_core::{encode_client_message, Authentication, Payload};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_records_frames_and_delivers_injected_ones() {
        // Arrange
        let transport = MockTransport::new();
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        transport.on_binary(Arc::new(move |bytes: Vec<u8>| sink.lock().unwrap().push(bytes)));
        transport.connect().await.unwrap();
        let request = ClientMessage::new(0, "GET", Vec::new(), Authentication::default(), Payload::Empty);

        // Act
        transport
            .send(encode_client_message(&request).unwrap())
            .await
            .unwrap();
        transport.inject(vec![1, 2, 3]);

        // Assert
        assert_eq!(transport.sent_messages(), vec![request]);
        assert_eq!(*received.lock().unwrap(), vec![vec![1, 2, 3]]);
    }

    #[tokio::test]
    async fn test_send_failures_are_injectable() {
        let transport = MockTransport::new();
        assert_eq!(transport.send(vec![0]).await, Err(TransportError::NotConnected));

        transport.connect().await.unwrap();
        transport.set_fail_send(true);

        assert!(matches!(
            transport.send(vec![0]).await,
            Err(TransportError::SendFailed(_))
        ));
        assert!(transport.sent_frames().is_empty());
    }
}
