//! # Overflow policy for subscriber queues.
//!
//! [`OverflowPolicy`] decides what the hub does when a subscriber does not drain
//! its queue as fast as events are published. Whatever the policy, `publish`
//! never waits for a subscriber.
//!
//! - [`OverflowPolicy::Unbounded`] every subscriber gets an unbounded queue (default).
//! - [`OverflowPolicy::Disconnect`] bounded queue; a full queue evicts that subscriber.
//!
//! ## Choosing the right policy
//!
//! **Chat-scale deployments** (few clients, small messages):
//! ```text
//! OverflowPolicy::Unbounded            → no event is ever dropped,
//!                                        a stalled client only costs memory
//! ```
//!
//! **Untrusted or slow clients**:
//! ```text
//! OverflowPolicy::Disconnect {
//!     capacity: 256                    → client falls 256 events behind,
//! }                                      hub drops it, its session closes
//! ```
//!
//! An evicted subscriber receives nothing it would have to reorder: it keeps the
//! events already queued, then observes end-of-stream.

/// Policy controlling per-subscriber queue capacity and overflow handling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Unbounded queue; events are never dropped (default).
    Unbounded,
    /// Bounded queue of `capacity` events (min 1); overflow evicts the subscriber.
    Disconnect { capacity: usize },
}

impl OverflowPolicy {
    /// Returns the queue capacity, `None` when unbounded.
    #[inline]
    pub fn capacity(&self) -> Option<usize> {
        match self {
            OverflowPolicy::Unbounded => None,
            OverflowPolicy::Disconnect { capacity } => Some((*capacity).max(1)),
        }
    }
}

impl Default for OverflowPolicy {
    /// Returns [`OverflowPolicy::Unbounded`].
    fn default() -> Self {
        OverflowPolicy::Unbounded
    }
}
