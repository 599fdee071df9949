//! Room endpoint: upgrade, admit, pump.

use std::sync::Arc;

use axum::{
    extract::{State, ws::WebSocketUpgrade},
    response::Response,
};

use crate::{
    domain::{ConnectionUpgrade, MessageSink},
    infrastructure::connection::WebSocketUpgrader,
    ui::state::AppState,
    usecase::PeerPump,
};

pub async fn room_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    let upgrader = WebSocketUpgrader::new(ws, state.connection);
    admit(upgrader, state)
}

/// Upgrade the connection and serve it with a new pump joined to the room.
pub fn admit<U: ConnectionUpgrade>(upgrader: U, state: Arc<AppState>) -> U::Response {
    upgrader.upgrade(move |reader, writer| async move {
        let (peer, queue) = state.room.new_peer();
        tracing::info!(peer = %peer.id(), "connection admitted");

        let room: Arc<dyn MessageSink> = Arc::new(state.room.clone());
        PeerPump::new(peer, queue, reader, writer, room, state.pump)
            .run()
            .await;
    })
}
