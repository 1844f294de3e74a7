//! Three in-process clients on one hub, no network.
//!
//! ```text
//! cargo run --example in_memory
//! ```

use std::sync::Arc;
use std::time::Duration;

use chat_relay::transport::memory::{self, MemoryPeer};
use chat_relay::{Codec, Hub, JsonCodec, Session};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

async fn drain(name: &str, peer: &mut MemoryPeer) {
    while let Ok(Some(text)) = tokio::time::timeout(Duration::from_millis(50), peer.recv()).await {
        match JsonCodec.decode(&text) {
            Ok(event) => println!(
                "{name} <- {} {} {}",
                event.kind(),
                event.user(),
                event.message().unwrap_or("")
            ),
            Err(e) => println!("{name} <- undecodable: {e}"),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chat_relay=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .ok();

    let hub = Hub::builder().replay_capacity(25).build();
    let codec: Arc<dyn Codec> = Arc::new(JsonCodec);
    let token = CancellationToken::new();

    let mut peers = Vec::new();
    let mut sessions = Vec::new();
    for name in ["alice", "bob", "carol"] {
        let (conn, peer) = memory::pair();
        sessions.push(Session::spawn(hub.clone(), codec.clone(), conn, token.child_token()));
        peer.send(format!(r#"{{"type":"JOIN","user":"{name}"}}"#));
        peers.push((name, peer));
    }

    peers[0].1.send(r#"{"type":"MESSAGE","user":"alice","message":"hi all"}"#);
    peers[1].1.hang_up();
    tokio::time::sleep(Duration::from_millis(50)).await;
    peers[2].1.send(r#"{"type":"MESSAGE","user":"carol","message":"bye bob"}"#);

    for (name, peer) in &mut peers {
        drain(name, peer).await;
    }

    token.cancel();
    for session in sessions {
        if let Ok(reason) = session.await {
            println!("session closed: {reason}");
        }
    }
    println!("replay window holds {} event(s)", hub.replay_snapshot().len());
}
