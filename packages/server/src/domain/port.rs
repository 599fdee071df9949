//! Capability traits at the seams between the hub, the pumps and the
//! transport.
//!
//! The hub is only reachable through [`MessageSink`]; the pumps only see a
//! connection through [`PeerReader`] and [`PeerWriter`]; request handlers
//! only turn requests into connections through [`ConnectionUpgrade`].

use std::future::Future;

use async_trait::async_trait;

use super::{HubError, Message, Peer, PeerId, TransportError};

/// Anything that accepts membership changes and broadcasts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Register a peer. Its outbound queue starts receiving broadcasts.
    async fn join(&self, peer: Peer) -> Result<(), HubError>;

    /// Remove a peer and close its outbound queue. No-op for non-members.
    async fn leave(&self, peer_id: PeerId) -> Result<(), HubError>;

    /// Fan a message out to every current member.
    async fn broadcast(&self, message: Message) -> Result<(), HubError>;
}

/// Read half of a peer connection.
#[async_trait]
pub trait PeerReader: Send {
    /// Wait for the next inbound message.
    ///
    /// Any error is terminal; callers must not call `receive` again.
    async fn receive(&mut self) -> Result<Message, TransportError>;
}

/// Write half of a peer connection.
#[async_trait]
pub trait PeerWriter: Send {
    async fn send(&mut self, message: Message) -> Result<(), TransportError>;

    /// Send a keepalive probe.
    async fn ping(&mut self) -> Result<(), TransportError>;

    /// Send a close notification and shut the write half down.
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Something that can turn an inbound request into a duplex peer connection.
pub trait ConnectionUpgrade: Send + 'static {
    type Reader: PeerReader + 'static;
    type Writer: PeerWriter + 'static;
    /// What the request handler answers with while the upgrade proceeds.
    type Response;

    /// Complete the upgrade and hand the connection halves to `on_connected`,
    /// which runs for the lifetime of the connection.
    fn upgrade<F, Fut>(self, on_connected: F) -> Self::Response
    where
        F: FnOnce(Self::Reader, Self::Writer) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static;
}
