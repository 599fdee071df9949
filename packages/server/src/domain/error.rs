//! Domain error types.

use thiserror::Error;

/// Failure of an established peer connection.
///
/// Every variant is terminal for the pump that observes it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The remote side closed the connection.
    #[error("connection closed")]
    Closed,

    /// A read or write deadline expired.
    #[error("deadline exceeded")]
    Timeout,

    /// An inbound frame exceeded the size limit.
    #[error("frame of {size} bytes exceeds the {limit} byte limit")]
    FrameTooLarge { size: usize, limit: usize },

    /// An inbound frame of a kind the room does not carry (e.g. binary).
    #[error("unsupported frame: {0}")]
    UnsupportedFrame(&'static str),

    /// Any other protocol or I/O failure reported by the transport.
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Failure to reach the room hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HubError {
    /// The hub task is no longer running.
    #[error("room hub is not running")]
    Closed,
}
