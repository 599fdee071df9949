//! Peer identity and the per-peer outbound queue.

use std::fmt;

use serde::Serialize;
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};
use uuid::Uuid;

use super::Message;

/// Unique identity of a connected peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PeerId(Uuid);

impl PeerId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Outcome of handing a message to a peer's outbound queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Queued,
    /// The queue is at capacity; the peer is not draining fast enough.
    Full,
    /// The receiving side is gone; the peer's outbound loop has exited.
    Closed,
}

/// One connected client as seen by the room.
///
/// A `Peer` holds the only sending half of its outbound queue. Dropping it
/// closes the queue, so the queue is closed exactly once: when the owner of
/// the `Peer` (the hub, once joined) lets go of it.
#[derive(Debug)]
pub struct Peer {
    id: PeerId,
    outbound: mpsc::Sender<Message>,
}

impl Peer {
    /// Create a peer together with the receiving end of its bounded queue.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> (Peer, OutboundQueue) {
        let (outbound, rx) = mpsc::channel(capacity);
        let peer = Peer {
            id: PeerId::generate(),
            outbound,
        };
        (peer, OutboundQueue { rx })
    }

    pub fn id(&self) -> PeerId {
        self.id
    }

    /// Enqueue without waiting.
    pub fn try_deliver(&self, message: Message) -> Delivery {
        match self.outbound.try_send(message) {
            Ok(()) => Delivery::Queued,
            Err(TrySendError::Full(_)) => Delivery::Full,
            Err(TrySendError::Closed(_)) => Delivery::Closed,
        }
    }
}

/// Receiving end of a peer's outbound queue, drained by its outbound loop.
#[derive(Debug)]
pub struct OutboundQueue {
    rx: mpsc::Receiver<Message>,
}

impl OutboundQueue {
    /// Wait for the next message.
    ///
    /// Returns `None` once the queue is closed and every message queued
    /// before the closure has been handed out.
    pub async fn recv(&mut self) -> Option<Message> {
        self.rx.recv().await
    }

    /// Take every message that is already waiting, without blocking.
    pub fn drain_ready(&mut self) -> Vec<Message> {
        let mut ready = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(message) => ready.push(message),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        ready
    }

    /// Number of messages currently waiting.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Read-only view of a member, as reported by the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeerSnapshot {
    pub peer_id: PeerId,
    /// Unix timestamp (milliseconds) at which the hub applied the join.
    pub joined_at: i64,
}
