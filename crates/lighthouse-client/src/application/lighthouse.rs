//! The typed verb API.
//!
//! [`Lighthouse`] wraps a [`Multiplexer`] and the user's credentials.  Each
//! one-shot method sends exactly one request and **checks the status code
//! before returning**: a non-200 response comes back as
//! [`LighthouseError::Server`], never as an `Ok` with a bad code.
//!
//! [`stream`](Lighthouse::stream) is the exception: a stream may carry error
//! responses between good ones, so its elements are delivered unchecked.
//!
//! # Example
//!
//! ```no_run
//! use futures_util::StreamExt;
//! use lighthouse_client::{connect_websocket, ClientConfig};
//! use lighthouse_core::{Authentication, Payload};
//!
//! # async fn run() -> Result<(), lighthouse_client::LighthouseError> {
//! let lh = connect_websocket(ClientConfig::new(Authentication::new("alice", "token"))).await?;
//! let mut inputs = lh.stream_model().await?;
//! while let Some(msg) = inputs.next().await {
//!     if let Payload::InputEvent(event) = msg.payload {
//!         println!("{event:?}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use lighthouse_core::{Authentication, DirectoryTree, Frame, Payload, ServerMessage, Verb};

use crate::application::multiplexer::{ConnectionState, LighthouseError, Multiplexer, ResponseStream};
use crate::application::transport::Transport;

/// A connection to the lighthouse with typed request methods.
///
/// Cloning is cheap and every clone shares the same connection, so a clone
/// can be moved into a spawned task.
#[derive(Clone)]
pub struct Lighthouse {
    multiplexer: Arc<Multiplexer>,
    authentication: Authentication,
}

impl Lighthouse {
    /// Creates an unconnected client over `transport`.
    pub fn new(transport: Arc<dyn Transport>, authentication: Authentication) -> Self {
        Self {
            multiplexer: Arc::new(Multiplexer::new(transport)),
            authentication,
        }
    }

    /// Connects the underlying transport.
    ///
    /// # Errors
    ///
    /// See [`Multiplexer::connect`].
    pub async fn connect(&self) -> Result<(), LighthouseError> {
        self.multiplexer.connect().await
    }

    pub fn state(&self) -> ConnectionState {
        self.multiplexer.state()
    }

    /// Requests still waiting for a response, open streams included.
    pub fn pending_requests(&self) -> usize {
        self.multiplexer.pending_requests()
    }

    pub fn authentication(&self) -> &Authentication {
        &self.authentication
    }

    /// `["user", <username>, "model"]`, the user's own display.
    pub fn model_path(&self) -> Vec<String> {
        vec![
            "user".to_string(),
            self.authentication.username.clone(),
            "model".to_string(),
        ]
    }

    // ── Convenience ───────────────────────────────────────────────────────────

    /// Sends `frame` to the user's model.
    pub async fn put_model(&self, frame: Frame) -> Result<ServerMessage, LighthouseError> {
        self.perform(Verb::PUT, &self.model_path(), Payload::Frame(frame))
            .await
    }

    /// Streams the user's model: input events from the web interface and the
    /// frames other clients put.
    pub async fn stream_model(&self) -> Result<ResponseStream, LighthouseError> {
        self.stream(&self.model_path(), Payload::Empty).await
    }

    // ── Verbs ─────────────────────────────────────────────────────────────────

    /// `POST`: creates and updates the resource, combining `CREATE` and `PUT`.
    pub async fn post(
        &self,
        path: &[impl AsRef<str>],
        payload: impl Into<Payload>,
    ) -> Result<ServerMessage, LighthouseError> {
        self.perform(Verb::POST, path, payload.into()).await
    }

    /// `PUT`: updates the resource.
    pub async fn put(
        &self,
        path: &[impl AsRef<str>],
        payload: impl Into<Payload>,
    ) -> Result<ServerMessage, LighthouseError> {
        self.perform(Verb::PUT, path, payload.into()).await
    }

    /// `CREATE`: creates a resource.
    pub async fn create(&self, path: &[impl AsRef<str>]) -> Result<ServerMessage, LighthouseError> {
        self.perform(Verb::CREATE, path, Payload::Empty).await
    }

    /// `DELETE`: deletes a resource.
    pub async fn delete(&self, path: &[impl AsRef<str>]) -> Result<ServerMessage, LighthouseError> {
        self.perform(Verb::DELETE, path, Payload::Empty).await
    }

    /// `MKDIR`: creates a directory.
    pub async fn mkdir(&self, path: &[impl AsRef<str>]) -> Result<ServerMessage, LighthouseError> {
        self.perform(Verb::MKDIR, path, Payload::Empty).await
    }

    /// `LIST`: lists a directory.
    ///
    /// A successful response without a directory payload yields an empty tree.
    pub async fn list(&self, path: &[impl AsRef<str>]) -> Result<DirectoryTree, LighthouseError> {
        let response = self.perform(Verb::LIST, path, Payload::Empty).await?;
        Ok(match response.payload {
            Payload::DirectoryTree(tree) => tree,
            _ => DirectoryTree::new(),
        })
    }

    /// `GET`: fetches a resource.
    pub async fn get(&self, path: &[impl AsRef<str>]) -> Result<ServerMessage, LighthouseError> {
        self.perform(Verb::GET, path, Payload::Empty).await
    }

    /// `LINK`: links `source` to `dest`.
    ///
    /// `dest` is the request path; `source` travels as the payload.
    pub async fn link(
        &self,
        source: &[impl AsRef<str>],
        dest: &[impl AsRef<str>],
    ) -> Result<ServerMessage, LighthouseError> {
        self.perform(Verb::LINK, dest, Payload::Path(owned_path(source)))
            .await
    }

    /// `UNLINK`: removes the link from `source` to `dest`.
    pub async fn unlink(
        &self,
        source: &[impl AsRef<str>],
        dest: &[impl AsRef<str>],
    ) -> Result<ServerMessage, LighthouseError> {
        self.perform(Verb::UNLINK, dest, Payload::Path(owned_path(source)))
            .await
    }

    /// `STOP`: stops a stream.
    pub async fn stop(&self, path: &[impl AsRef<str>]) -> Result<ServerMessage, LighthouseError> {
        self.perform(Verb::STOP, path, Payload::Empty).await
    }

    /// Sends any one-shot request and checks the response code.
    ///
    /// # Errors
    ///
    /// - [`LighthouseError::Server`] if the response code is not 200.
    /// - [`LighthouseError::ProtocolUsage`] for `STREAM`; use [`stream`](Self::stream).
    /// - Transport and state errors from the multiplexer.
    pub async fn perform(
        &self,
        verb: impl Into<Verb>,
        path: &[impl AsRef<str>],
        payload: Payload,
    ) -> Result<ServerMessage, LighthouseError> {
        let response = self
            .multiplexer
            .send_one_shot(verb, owned_path(path), payload, &self.authentication)
            .await?;
        response.check()?;
        Ok(response)
    }

    /// `STREAM`: opens a stream of responses for `path`.
    ///
    /// The elements are not checked; a non-200 element is delivered as-is.
    pub async fn stream(
        &self,
        path: &[impl AsRef<str>],
        payload: Payload,
    ) -> Result<ResponseStream, LighthouseError> {
        self.multiplexer
            .send_streaming(Verb::STREAM, owned_path(path), payload, &self.authentication)
            .await
    }
}

fn owned_path(path: &[impl AsRef<str>]) -> Vec<String> {
    path.iter().map(|s| s.as_ref().to_owned()).collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
