//! Shared application state.

use crate::{
    infrastructure::connection::ConnectionConfig,
    usecase::{PumpConfig, RoomHandle},
};

/// State shared by every request handler.
pub struct AppState {
    /// Entry point to the single room hub
    pub room: RoomHandle,
    /// Keepalive and write deadlines for new pumps
    pub pump: PumpConfig,
    /// Frame limit and read deadline for new connections
    pub connection: ConnectionConfig,
}
