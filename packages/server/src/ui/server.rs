//! Server execution logic.

use std::{sync::Arc, time::Duration};

use axum::{Router, middleware, routing::get};
use tower_http::trace::TraceLayer;

use crate::{
    infrastructure::connection::ConnectionConfig,
    usecase::{HubConfig, PumpConfig, RoomHub},
};

use super::{
    error::ServerError,
    handler::{
        http::{health_check, login, room_state},
        websocket::room_handler,
    },
    middleware::auth::require_auth,
    signal::shutdown_signal,
    state::AppState,
};

/// Everything the server needs to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub hub: HubConfig,
    pub pump: PumpConfig,
    pub connection: ConnectionConfig,
}

impl ServerConfig {
    /// Defaults for everything but the listen address.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            hub: HubConfig::default(),
            pump: PumpConfig::default(),
            connection: ConnectionConfig::default(),
        }
    }

    /// Set the keepalive period; the read deadline follows it.
    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.pump.ping_interval = interval;
        self.connection.pong_wait = self.pump.pong_wait();
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.hub.outbound_capacity = capacity;
        self
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Build the application router around shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // WebSocket endpoint, gated
        .route(
            "/room",
            get(room_handler).layer(middleware::from_fn(require_auth)),
        )
        // HTTP endpoints
        .route("/login", get(login))
        .route("/api/health", get(health_check))
        .route("/api/room", get(room_state))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// WebSocket broadcast server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(ServerConfig::new("127.0.0.1", 8080));
/// server.run().await?;
/// ```
pub struct Server {
    config: ServerConfig,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Start the hub, bind the listener and serve until a shutdown signal.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound or serving fails.
    pub async fn run(self) -> Result<(), ServerError> {
        let ServerConfig {
            hub,
            pump,
            connection,
            ..
        } = self.config.clone();

        let (room, _hub_task) = RoomHub::spawn(hub);
        let app = router(Arc::new(AppState {
            room,
            pump,
            connection,
        }));

        let bind_addr = self.config.bind_addr();
        let listener = tokio::net::TcpListener::bind(&bind_addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: bind_addr.clone(),
                source,
            })?;

        tracing::info!("room server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/room", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
