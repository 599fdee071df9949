//! Peer connection adapter.
//!
//! - `framing`: inbound frame validation and normalization
//! - `websocket`: [`PeerReader`](crate::domain::PeerReader) /
//!   [`PeerWriter`](crate::domain::PeerWriter) over an axum WebSocket, and
//!   the [`ConnectionUpgrade`](crate::domain::ConnectionUpgrade) for it

pub mod framing;
pub mod websocket;

use std::time::Duration;

pub use websocket::{WebSocketReader, WebSocketUpgrader, WebSocketWriter};

/// Largest inbound frame accepted from a peer, in bytes.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub max_frame_bytes: usize,
    /// Read deadline, refreshed on every pong.
    pub pong_wait: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            pong_wait: Duration::from_secs(60),
        }
    }
}
