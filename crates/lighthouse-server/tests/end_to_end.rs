//! End-to-end tests: the real client against a live server on a loopback port.
//!
//! Each test binds its own server to port 0, so the tests can run in parallel.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use futures_util::{future::join_all, StreamExt};
use lighthouse_client::{connect_websocket, ClientConfig, Lighthouse, LighthouseError};
use lighthouse_core::{Authentication, Color, Entry, Frame, Payload};
use lighthouse_server::{ConnectionRegistry, LighthouseServer, ServerConfig};
use tokio::time::timeout;

const DEADLINE: Duration = Duration::from_secs(5);

struct TestServer {
    addr: SocketAddr,
    registry: Arc<ConnectionRegistry>,
    running: Arc<AtomicBool>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
    }
}

async fn start_server() -> TestServer {
    let config = ServerConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        ..ServerConfig::default()
    };
    let server = LighthouseServer::bind(&config).await.unwrap();
    let addr = server.local_addr().unwrap();
    let registry = server.registry();
    let running = Arc::new(AtomicBool::new(true));
    tokio::spawn(server.run(Arc::clone(&running)));
    TestServer {
        addr,
        registry,
        running,
    }
}

async fn client(server: &TestServer, user: &str) -> Lighthouse {
    let config = ClientConfig::new(Authentication::new(user, "API-TOK_test"))
        .with_url(format!("ws://{}/websocket", server.addr));
    timeout(DEADLINE, connect_websocket(config))
        .await
        .expect("connect timed out")
        .expect("connect failed")
}

#[tokio::test]
async fn test_put_model_is_acknowledged_and_readable() {
    // Arrange
    let server = start_server().await;
    let alice = client(&server, "alice").await;
    let frame = Frame::fill(Color::MAGENTA);

    // Act
    let put = timeout(DEADLINE, alice.put_model(frame.clone())).await.unwrap();
    let get = timeout(DEADLINE, alice.get(&alice.model_path()[..]))
        .await
        .unwrap();

    // Assert
    assert!(put.unwrap().is_ok());
    assert_eq!(get.unwrap().payload, Payload::Frame(frame));
}

#[tokio::test]
async fn test_unknown_verb_is_a_server_error() {
    let server = start_server().await;
    let alice = client(&server, "alice").await;

    let result = timeout(DEADLINE, alice.perform("FOO", &["x"], Payload::Empty))
        .await
        .unwrap();

    match result {
        Err(LighthouseError::Server { code, message }) => {
            assert_eq!(code, 400);
            assert_eq!(message.as_deref(), Some("Bad Request"));
        }
        other => panic!("expected a 400 server error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_put_fans_out_to_streaming_peer() {
    // Arrange: alice streams, and waits for the STREAM acknowledgement so the
    // server has enabled pushes before bob puts.
    let server = start_server().await;
    let alice = client(&server, "alice").await;
    let bob = client(&server, "bob").await;
    let mut stream = timeout(DEADLINE, alice.stream_model()).await.unwrap().unwrap();
    let ack = timeout(DEADLINE, stream.next()).await.unwrap().unwrap();
    assert!(ack.is_ok());
    assert_eq!(ack.request_id, stream.request_id());
    let frame = Frame::fill(Color::YELLOW);

    // Act
    timeout(DEADLINE, bob.put_model(frame.clone()))
        .await
        .unwrap()
        .unwrap();

    // Assert
    let push = timeout(DEADLINE, stream.next()).await.unwrap().unwrap();
    assert_eq!(push.request_id, stream.request_id());
    assert_eq!(push.payload, Payload::Frame(frame));
}

#[tokio::test]
async fn test_list_shows_every_named_connection() {
    let server = start_server().await;
    let alice = client(&server, "alice").await;
    let bob = client(&server, "bob").await;
    timeout(DEADLINE, bob.create(&["user", "bob", "model"]))
        .await
        .unwrap()
        .unwrap();

    let tree = timeout(DEADLINE, alice.list(&["user"])).await.unwrap().unwrap();

    assert_eq!(tree.lookup(&["user", "alice", "model"]), Some(&Entry::Resource));
    assert_eq!(tree.lookup(&["user", "bob", "model"]), Some(&Entry::Resource));
}

#[tokio::test]
async fn test_concurrent_requests_all_complete() {
    // Arrange
    let server = start_server().await;
    let alice = client(&server, "alice").await;
    let colors = [Color::RED, Color::GREEN, Color::BLUE, Color::WHITE];

    // Act: many requests in flight on the one socket at once.
    let calls = (0..32).map(|i| {
        let alice = alice.clone();
        async move { alice.put_model(Frame::fill(colors[i % colors.len()])).await }
    });
    let results = timeout(DEADLINE, join_all(calls)).await.unwrap();

    // Assert
    assert!(results.iter().all(|r| matches!(r, Ok(msg) if msg.is_ok())));
    assert_eq!(alice.pending_requests(), 0);
}

#[tokio::test]
async fn test_disconnect_removes_the_session() {
    // Arrange
    let server = start_server().await;
    let alice = client(&server, "alice").await;
    timeout(DEADLINE, alice.create(&["x"])).await.unwrap().unwrap();
    assert_eq!(server.registry.len(), 1);

    // Act
    drop(alice);

    // Assert
    timeout(DEADLINE, async {
        while !server.registry.is_empty() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("session was not removed after disconnect");
}
