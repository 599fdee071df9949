//! Application layer: the room hub and the per-peer pump.

mod peer_pump;
mod room_hub;

pub use peer_pump::{PeerPump, PumpConfig};
pub use room_hub::{HubConfig, RoomHandle, RoomHub};
