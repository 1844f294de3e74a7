//! Backpressure policies.
//!
//! ## Contents
//! - [`OverflowPolicy`] what happens when a subscriber's queue fills up
//!
//! ## Quick wiring
//! ```text
//! HubConfig { replay_capacity, overflow: OverflowPolicy }
//!      └─► hub::SubscriberSet uses:
//!           - overflow.capacity() to pick bounded/unbounded channels
//!           - eviction on a full bounded queue
//! ```
//!
//! ## Defaults
//! - `OverflowPolicy::Unbounded`.

mod overflow;

pub use overflow::OverflowPolicy;
