//! Broadcast hub: one ordered event stream, bounded replay, many subscribers.
//!
//! ## Contents
//! - [`Hub`], [`HubBuilder`] the shared publish point and its builder
//! - [`Subscription`] replay-then-live handle returned by `subscribe`
//! - [`SubscriberId`] arena key of one registered subscriber
//! - `ReplayBuffer` bounded history (internal)
//! - `SubscriberSet` per-subscriber queues and fan-out (internal)
//!
//! ## Quick reference
//! - **Publishers**: `Session` inbound duty and teardown.
//! - **Consumers**: `Session` outbound duty via [`Subscription`].

mod hub;
mod replay;
mod subscriber_set;
mod subscription;

pub use hub::{Hub, HubBuilder};
pub use subscriber_set::SubscriberId;
pub use subscription::Subscription;
