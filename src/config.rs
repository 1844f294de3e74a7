//! # Relay configuration.
//!
//! Provides [`HubConfig`] for the broadcast hub and, with the `websocket`
//! feature, [`ServerConfig`] for the accept loop.
//!
//! Config is used in two ways:
//! 1. **Hub creation**: `Hub::new(config)` / `Hub::builder().config(config)`
//! 2. **Server creation**: `Server::bind(server_config, hub)`
//!
//! ## Sentinel values
//! - `replay_capacity = 0` → no history; late joiners only see live events
//! - `grace = 0s` → do not wait for sessions on shutdown: running sessions are
//!   aborted without leave events and shutdown still returns `Ok`

#[cfg(feature = "websocket")]
use std::net::{Ipv4Addr, SocketAddr};
#[cfg(feature = "websocket")]
use std::time::Duration;

use crate::policies::OverflowPolicy;

/// Default number of events replayed to a new subscriber.
pub const DEFAULT_REPLAY_CAPACITY: usize = 25;

/// Configuration for the broadcast hub.
///
/// ## Field semantics
/// - `replay_capacity`: how many recent events a new subscriber receives first
/// - `overflow`: per-subscriber queue policy (see [`OverflowPolicy`])
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HubConfig {
    /// Size of the replay window (`R`).
    pub replay_capacity: usize,

    /// Backpressure policy for subscriber queues.
    pub overflow: OverflowPolicy,
}

impl HubConfig {
    /// Returns the per-subscriber queue capacity, `None` when unbounded.
    #[inline]
    pub fn queue_capacity(&self) -> Option<usize> {
        self.overflow.capacity()
    }
}

impl Default for HubConfig {
    /// Default configuration:
    ///
    /// - `replay_capacity = 25`
    /// - `overflow = OverflowPolicy::Unbounded`
    fn default() -> Self {
        Self {
            replay_capacity: DEFAULT_REPLAY_CAPACITY,
            overflow: OverflowPolicy::default(),
        }
    }
}

/// Configuration for the WebSocket relay server.
#[cfg(feature = "websocket")]
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Address the listener binds to.
    pub addr: SocketAddr,

    /// Maximum time to wait for sessions to finish after a shutdown signal.
    ///
    /// When a shutdown signal is received:
    /// - Sessions are cancelled via `CancellationToken` (each publishes its leave event)
    /// - Server waits up to `grace` for session tasks to exit
    /// - If exceeded, returns `RuntimeError::GraceExceeded`
    /// - `0s` skips the wait: remaining sessions are aborted and `run` returns `Ok`
    pub grace: Duration,
}

#[cfg(feature = "websocket")]
impl Default for ServerConfig {
    /// Default configuration:
    ///
    /// - `addr = 127.0.0.1:8080`
    /// - `grace = 5s`
    fn default() -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            grace: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = HubConfig::default();
        assert_eq!(cfg.replay_capacity, 25);
        assert_eq!(cfg.queue_capacity(), None);
    }

    #[test]
    fn test_queue_capacity_follows_policy() {
        let cfg = HubConfig {
            overflow: OverflowPolicy::Disconnect { capacity: 4 },
            ..HubConfig::default()
        };
        assert_eq!(cfg.queue_capacity(), Some(4));
    }
}
