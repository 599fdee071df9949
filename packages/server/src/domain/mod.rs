//! Domain layer: peers, messages and the capability traits the hub and the
//! pumps are written against.

mod error;
mod message;
mod peer;
mod port;

pub use error::{HubError, TransportError};
pub use message::Message;
pub use peer::{Delivery, OutboundQueue, Peer, PeerId, PeerSnapshot};
pub use port::{ConnectionUpgrade, MessageSink, PeerReader, PeerWriter};

#[cfg(test)]
pub use port::MockMessageSink;
