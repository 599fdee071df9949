//! Single-room WebSocket broadcast server.
//!
//! Every message a peer sends to `/room` is fanned out to all connected
//! peers, the sender included.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin agora-server
//! cargo run --bin agora-server -- --host 0.0.0.0 --port 3000 --log-level debug
//! ```

use std::time::Duration;

use agora_server::ui::{Server, ServerConfig};
use agora_shared::logger::setup_logger;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "agora-server")]
#[command(about = "Single-room WebSocket broadcast server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Default log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Pending messages a peer may fall behind before it is disconnected
    #[arg(long, default_value = "256", value_parser = clap::value_parser!(u32).range(1..))]
    queue_capacity: u32,

    /// Seconds between keepalive pings; peers silent for six periods are dropped
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u64).range(1..))]
    ping_interval_secs: u64,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let config = ServerConfig::new(args.host, args.port)
        .with_queue_capacity(args.queue_capacity as usize)
        .with_ping_interval(Duration::from_secs(args.ping_interval_secs));

    if let Err(e) = Server::new(config).run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
