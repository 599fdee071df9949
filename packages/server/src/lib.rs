//! Single-room WebSocket broadcaster.
//!
//! A [`usecase::RoomHub`] owns the membership set and fans every inbound
//! message out to all connected peers. Each peer is served by a
//! [`usecase::PeerPump`] that bridges its WebSocket to the hub.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
