//! WebSocket chat relay.
//!
//! ```text
//! cargo run --example chat_server --features websocket -- --addr 0.0.0.0:8080
//! RUST_LOG=chat_relay=debug cargo run --example chat_server --features websocket
//! ```
//!
//! Clients connect to `ws://<addr>/websocket/chat` and exchange
//! `{"type":"JOIN"|"MESSAGE"|"USER_LEFT","user":"...","message":"..."}` records.

use std::net::SocketAddr;
use std::time::Duration;

use chat_relay::{
    DEFAULT_REPLAY_CAPACITY, Hub, HubConfig, OverflowPolicy, RuntimeError, Server, ServerConfig,
};
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "chat_server")]
#[command(about = "Broadcast chat relay over WebSocket", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8080")]
    addr: SocketAddr,

    /// Number of recent events replayed to a new client
    #[arg(long, default_value_t = DEFAULT_REPLAY_CAPACITY)]
    replay: usize,

    /// Per-client queue capacity; clients that fall behind are disconnected (0 = unbounded)
    #[arg(long, default_value_t = 0)]
    queue_capacity: usize,

    /// Seconds to wait for sessions to close on shutdown
    #[arg(long, default_value_t = 5)]
    grace: u64,
}

impl Args {
    fn hub_config(&self) -> HubConfig {
        let overflow = match self.queue_capacity {
            0 => OverflowPolicy::Unbounded,
            capacity => OverflowPolicy::Disconnect { capacity },
        };
        HubConfig {
            replay_capacity: self.replay,
            overflow,
        }
    }

    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            addr: self.addr,
            grace: Duration::from_secs(self.grace),
        }
    }
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("chat_relay=info,chat_server=info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .ok();
}

#[tokio::main]
async fn main() -> Result<(), RuntimeError> {
    let args = Args::parse();
    init_logging();

    let hub = Hub::new(args.hub_config());
    let server = Server::bind(args.server_config(), hub).await?;
    tracing::info!(addr = %server.local_addr()?, "clients connect to /websocket/chat");
    server.run().await
}
