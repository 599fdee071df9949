//! Peer pump: the two loops that bridge one peer's connection to the hub.
//!
//! The inbound loop reads from the connection and hands every message to the
//! hub. The outbound loop drains the peer's queue onto the connection and
//! sends keepalive probes in between. Neither loop stops the other: the
//! outbound loop ends when the hub closes the queue, the inbound loop ends
//! when the transport fails.

use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::{Instant, MissedTickBehavior};

use crate::domain::{
    Message, MessageSink, OutboundQueue, Peer, PeerId, PeerReader, PeerWriter, TransportError,
};

/// Read deadline as a multiple of the ping interval.
pub const PONG_WAIT_FACTOR: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpConfig {
    /// Period between keepalive probes.
    pub ping_interval: Duration,
    /// Deadline for any single write.
    pub write_wait: Duration,
}

impl PumpConfig {
    /// How long the read side waits for a probe acknowledgment.
    pub fn pong_wait(&self) -> Duration {
        self.ping_interval * PONG_WAIT_FACTOR
    }
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(10),
            write_wait: Duration::from_secs(10),
        }
    }
}

/// One admitted peer, ready to be joined and served.
pub struct PeerPump<R, W> {
    peer: Peer,
    queue: OutboundQueue,
    reader: R,
    writer: W,
    room: Arc<dyn MessageSink>,
    config: PumpConfig,
}

impl<R, W> PeerPump<R, W>
where
    R: PeerReader + 'static,
    W: PeerWriter + 'static,
{
    pub fn new(
        peer: Peer,
        queue: OutboundQueue,
        reader: R,
        writer: W,
        room: Arc<dyn MessageSink>,
        config: PumpConfig,
    ) -> Self {
        Self {
            peer,
            queue,
            reader,
            writer,
            room,
            config,
        }
    }

    /// Join the room and serve the connection until both loops have ended.
    pub async fn run(self) {
        let Self {
            peer,
            queue,
            reader,
            writer,
            room,
            config,
        } = self;
        let peer_id = peer.id();

        if let Err(e) = room.join(peer).await {
            tracing::warn!(peer = %peer_id, "could not join room: {}", e);
            return;
        }

        let inbound = tokio::spawn(inbound_loop(peer_id, reader, room));
        let outbound = tokio::spawn(outbound_loop(peer_id, writer, queue, config));

        let (inbound, outbound) = tokio::join!(inbound, outbound);
        if let Err(e) = inbound {
            tracing::error!(peer = %peer_id, "inbound loop panicked: {}", e);
        }
        if let Err(e) = outbound {
            tracing::error!(peer = %peer_id, "outbound loop panicked: {}", e);
        }
        tracing::debug!(peer = %peer_id, "pump finished");
    }
}

/// Forward everything the peer sends to the room, then leave.
///
/// Returns the transport error that ended the loop, or `None` when the hub
/// stopped accepting messages first.
pub(crate) async fn inbound_loop<R: PeerReader>(
    peer_id: PeerId,
    mut reader: R,
    room: Arc<dyn MessageSink>,
) -> Option<TransportError> {
    let ended_by = loop {
        match reader.receive().await {
            Ok(message) => {
                tracing::debug!(peer = %peer_id, bytes = message.len(), "received");
                if let Err(e) = room.broadcast(message).await {
                    tracing::warn!(peer = %peer_id, "dropping message: {}", e);
                    break None;
                }
            }
            Err(TransportError::Closed) => {
                tracing::debug!(peer = %peer_id, "connection closed by peer");
                break Some(TransportError::Closed);
            }
            Err(e) => {
                tracing::warn!(peer = %peer_id, "read failed: {}", e);
                break Some(e);
            }
        }
    };

    if let Err(e) = room.leave(peer_id).await {
        tracing::warn!(peer = %peer_id, "could not leave room: {}", e);
    }
    ended_by
}

enum OutboundEvent {
    Queue(Option<Message>),
    Tick,
}

/// Drain the peer's queue onto the connection, probing at every tick.
///
/// Ends when the queue is closed (after sending a close notification) or on
/// the first failed write.
pub(crate) async fn outbound_loop<W: PeerWriter>(
    peer_id: PeerId,
    mut writer: W,
    mut queue: OutboundQueue,
    config: PumpConfig,
) {
    let mut ticker = tokio::time::interval_at(
        Instant::now() + config.ping_interval,
        config.ping_interval,
    );
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let event = tokio::select! {
            next = queue.recv() => OutboundEvent::Queue(next),
            _ = ticker.tick() => OutboundEvent::Tick,
        };

        match event {
            OutboundEvent::Queue(Some(first)) => {
                let frame = Message::coalesce(first, queue.drain_ready());
                if let Err(e) = with_deadline(config.write_wait, writer.send(frame)).await {
                    tracing::warn!(peer = %peer_id, "write failed: {}", e);
                    break;
                }
            }
            OutboundEvent::Queue(None) => {
                tracing::debug!(peer = %peer_id, "outbound queue closed, closing connection");
                if let Err(e) = with_deadline(config.write_wait, writer.close()).await {
                    tracing::debug!(peer = %peer_id, "close notification failed: {}", e);
                }
                break;
            }
            OutboundEvent::Tick => {
                if let Err(e) = with_deadline(config.write_wait, writer.ping()).await {
                    tracing::warn!(peer = %peer_id, "keepalive failed: {}", e);
                    break;
                }
            }
        }
    }
}

async fn with_deadline<F>(wait: Duration, write: F) -> Result<(), TransportError>
where
    F: Future<Output = Result<(), TransportError>>,
{
    tokio::time::timeout(wait, write)
        .await
        .map_err(|_| TransportError::Timeout)?
}
