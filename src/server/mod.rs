//! # Server: WebSocket accept loop and graceful shutdown.
//!
//! The [`Server`] owns a TCP listener, a shared [`Hub`] and a codec. Every
//! accepted connection is upgraded to a WebSocket and handed to its own
//! [`Session`] task; the server only tracks the tasks for shutdown.
//!
//! ## Architecture
//! ```text
//! Server::bind(cfg, hub)            ── TcpListener::bind(cfg.addr)
//! Server::run()
//!   select! {
//!     shutdown_signal()             ── SIGINT / SIGTERM / SIGQUIT
//!     token.cancelled()             ── Server::shutdown_token().cancel()
//!     accept loop (finished session tasks are reaped as they end):
//!       accept ─► WsConnection::accept ─► Session::new(hub) ─► run(conn, child_token)
//!                                                     (one task per connection, JoinSet)
//!   }
//! Shutdown path:
//!   token.cancel()                  → every session publishes its leave event and closes
//!   wait_all_with_grace(cfg.grace):
//!       ├─ grace = 0    → abort everything, Ok(())
//!       ├─ all joined   → Ok(())
//!       └─ timeout      → abort the rest, Err(RuntimeError::GraceExceeded)
//! ```
//!
//! Request paths are not routed: every successful upgrade joins the hub.
//!
//! ## Example
//! ```rust,no_run
//! use chat_relay::{Hub, Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), chat_relay::RuntimeError> {
//!     let hub = Hub::builder().build();
//!     let server = Server::bind(ServerConfig::default(), hub).await?;
//!     server.run().await
//! }
//! ```

mod shutdown;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::codec::{Codec, JsonCodec};
use crate::config::ServerConfig;
use crate::error::RuntimeError;
use crate::hub::Hub;
use crate::session::{CloseReason, Session};
use crate::transport::ws::WsConnection;

/// Pause after a failed `accept` (e.g. file descriptor exhaustion).
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// WebSocket relay server bound to a local address.
pub struct Server {
    cfg: ServerConfig,
    hub: Arc<Hub>,
    codec: Arc<dyn Codec>,
    listener: TcpListener,
    token: CancellationToken,
}

impl Server {
    /// Binds the listener; sessions use [`JsonCodec`] unless replaced with [`with_codec`](Self::with_codec).
    pub async fn bind(cfg: ServerConfig, hub: Arc<Hub>) -> Result<Self, RuntimeError> {
        let listener = TcpListener::bind(cfg.addr)
            .await
            .map_err(RuntimeError::Bind)?;
        Ok(Self {
            cfg,
            hub,
            codec: Arc::new(JsonCodec),
            listener,
            token: CancellationToken::new(),
        })
    }

    pub fn with_codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = codec;
        self
    }

    /// Actual bound address (useful with port 0).
    pub fn local_addr(&self) -> Result<SocketAddr, RuntimeError> {
        self.listener.local_addr().map_err(RuntimeError::Bind)
    }

    /// Token that stops [`run`](Self::run) as if a shutdown signal had arrived.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    /// Accepts connections until a shutdown signal or the shutdown token, then
    /// cancels every session and waits up to `grace` for them to finish.
    pub async fn run(self) -> Result<(), RuntimeError> {
        let addr = self.local_addr()?;
        info!(%addr, grace = ?self.cfg.grace, "relay listening");

        let mut sessions = JoinSet::new();
        let outcome = tokio::select! {
            res = shutdown::shutdown_signal() => res.map(|signal| {
                info!(signal, "shutdown signal received");
            }),
            _ = self.token.cancelled() => {
                info!("shutdown requested");
                Ok(())
            }
            _ = self.accept_loop(&mut sessions) => Ok(()),
        };
        if let Err(e) = &outcome {
            warn!(error = %e, label = e.as_label(), "shutdown signal unavailable; stopping");
        }

        self.token.cancel();
        let graced = self.wait_all_with_grace(&mut sessions).await;
        outcome.and(graced)
    }

    /// Accepts forever, spawning one session task per connection and reaping finished ones.
    async fn accept_loop(&self, sessions: &mut JoinSet<CloseReason>) {
        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        debug!(%peer, "connection accepted");
                        let _ = sessions.spawn(self.serve(stream, peer));
                    }
                    Err(e) => {
                        warn!(error = %e, "accept failed");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                },
                Some(joined) = sessions.join_next(), if !sessions.is_empty() => match joined {
                    Ok(reason) => debug!(reason = reason.as_label(), "session reaped"),
                    Err(e) => warn!(error = %e, "session task failed"),
                },
            }
        }
    }

    /// Builds the task for one connection: handshake, then a session bound to a child token.
    fn serve(
        &self,
        stream: TcpStream,
        peer: SocketAddr,
    ) -> impl Future<Output = CloseReason> + Send + 'static {
        let hub = Arc::clone(&self.hub);
        let codec = Arc::clone(&self.codec);
        let token = self.token.child_token();
        async move {
            let conn = tokio::select! {
                res = WsConnection::accept(stream) => match res {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(%peer, error = %e, "websocket handshake failed");
                        return CloseReason::Read(e);
                    }
                },
                _ = token.cancelled() => return CloseReason::Cancelled,
            };
            Session::new(hub, codec).run(conn, token).await
        }
    }

    /// Waits for all sessions within the configured grace period.
    ///
    /// A zero grace does not wait: sessions still running are aborted (they
    /// publish no leave event) and shutdown succeeds.
    async fn wait_all_with_grace(
        &self,
        sessions: &mut JoinSet<CloseReason>,
    ) -> Result<(), RuntimeError> {
        let grace = self.cfg.grace;
        if grace.is_zero() {
            let aborted = sessions.len();
            sessions.abort_all();
            while sessions.join_next().await.is_some() {}
            info!(aborted, "zero grace; sessions aborted");
            return Ok(());
        }

        let done = async { while sessions.join_next().await.is_some() {} };
        match tokio::time::timeout(grace, done).await {
            Ok(()) => {
                info!("all sessions stopped within grace");
                Ok(())
            }
            Err(_) => {
                let stuck = sessions.len();
                sessions.abort_all();
                warn!(?grace, stuck, "grace exceeded; aborting sessions");
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("addr", &self.listener.local_addr().ok())
            .field("grace", &self.cfg.grace)
            .field("hub", &self.hub)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use futures::{SinkExt, StreamExt};
    use tokio_tungstenite::tungstenite::Message;

    use super::*;
    use crate::events::Event;

    type Client = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    type Running = tokio::task::JoinHandle<Result<(), RuntimeError>>;

    async fn start(hub: Arc<Hub>) -> (SocketAddr, CancellationToken, Running) {
        start_with_grace(hub, Duration::from_secs(2)).await
    }

    async fn start_with_grace(
        hub: Arc<Hub>,
        grace: Duration,
    ) -> (SocketAddr, CancellationToken, Running) {
        let cfg = ServerConfig {
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
            grace,
        };
        let server = Server::bind(cfg, hub).await.unwrap();
        let addr = server.local_addr().unwrap();
        let token = server.shutdown_token();
        (addr, token, tokio::spawn(server.run()))
    }

    async fn connect(addr: SocketAddr) -> Client {
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/websocket/chat"))
            .await
            .unwrap();
        ws
    }

    async fn next_event(ws: &mut Client) -> Event {
        loop {
            let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
                .await
                .expect("timed out")
                .expect("stream ended")
                .unwrap();
            if let Message::Text(text) = msg {
                return JsonCodec.decode(text.as_str()).unwrap();
            }
        }
    }

    async fn wait_for_subscribers(hub: &Hub, n: usize) {
        for _ in 0..200 {
            if hub.subscriber_count() == n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {n} subscribers, got {}", hub.subscriber_count());
    }

    #[tokio::test]
    async fn test_bind_reports_address_in_use() {
        let hub = Hub::builder().build();
        let first = Server::bind(
            ServerConfig {
                addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
                ..ServerConfig::default()
            },
            Arc::clone(&hub),
        )
        .await
        .unwrap();
        let taken = ServerConfig {
            addr: first.local_addr().unwrap(),
            ..ServerConfig::default()
        };
        let err = Server::bind(taken, hub).await.unwrap_err();
        assert_eq!(err.as_label(), "runtime_bind");
    }

    #[tokio::test]
    async fn test_clients_share_one_stream() {
        let hub = Hub::builder().build();
        let (addr, token, handle) = start(Arc::clone(&hub)).await;

        let mut a = connect(addr).await;
        let mut b = connect(addr).await;
        wait_for_subscribers(&hub, 2).await;

        a.send(Message::text(r#"{"type":"JOIN","user":"alice"}"#))
            .await
            .unwrap();
        let joined = Event::join("alice").unwrap();
        assert_eq!(next_event(&mut a).await, joined);
        assert_eq!(next_event(&mut b).await, joined);

        b.send(Message::text(r#"{"type":"MESSAGE","user":"bob","message":"hey"}"#))
            .await
            .unwrap();
        let hey = Event::chat("bob", "hey").unwrap();
        assert_eq!(next_event(&mut a).await, hey);
        assert_eq!(next_event(&mut b).await, hey);

        a.close(None).await.unwrap();
        assert_eq!(next_event(&mut b).await, Event::left("alice").unwrap());

        token.cancel();
        handle.await.unwrap().unwrap();
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_late_client_gets_replay() {
        let hub = Hub::builder().replay_capacity(2).build();
        for i in 0..3 {
            hub.publish(Event::chat("old", &i.to_string()).unwrap());
        }
        let (addr, token, handle) = start(Arc::clone(&hub)).await;

        let mut c = connect(addr).await;
        assert_eq!(next_event(&mut c).await.message(), Some("1"));
        assert_eq!(next_event(&mut c).await.message(), Some("2"));

        token.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_publishes_leave_for_active_users() {
        let hub = Hub::builder().build();
        let (addr, token, handle) = start(Arc::clone(&hub)).await;

        let mut a = connect(addr).await;
        a.send(Message::text(r#"{"type":"JOIN","user":"alice"}"#))
            .await
            .unwrap();
        let _ = next_event(&mut a).await;

        token.cancel();
        handle.await.unwrap().unwrap();
        let snapshot = hub.replay_snapshot();
        assert_eq!(snapshot.last().map(|e| e.as_ref()), Some(&Event::left("alice").unwrap()));
    }

    #[tokio::test]
    async fn test_zero_grace_aborts_sessions_and_succeeds() {
        let hub = Hub::builder().build();
        let (addr, token, handle) = start_with_grace(Arc::clone(&hub), Duration::ZERO).await;

        let _a = connect(addr).await;
        let _b = connect(addr).await;
        wait_for_subscribers(&hub, 2).await;

        token.cancel();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("zero grace still waited")
            .unwrap()
            .unwrap();
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_idle_accept_loop_reaps_finished_sessions() {
        let cfg = ServerConfig {
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
            ..ServerConfig::default()
        };
        let server = Server::bind(cfg, Hub::builder().build()).await.unwrap();

        let mut sessions = JoinSet::new();
        for _ in 0..3 {
            let _ = sessions.spawn(async { CloseReason::EndOfInput });
        }
        let idle = tokio::time::timeout(
            Duration::from_millis(100),
            server.accept_loop(&mut sessions),
        )
        .await;

        assert!(idle.is_err());
        assert!(sessions.is_empty());
    }
}
