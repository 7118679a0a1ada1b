//! Turning domain state changes into events on private channels.
//!
//! Delivery is at-most-once: [`Broadcaster::emit`] enqueues without waiting,
//! a full queue drops the event, and nothing is retried. Clients recover by
//! refetching over REST.

pub mod authorizer;
pub mod broadcaster;
pub mod events;

pub use authorizer::{ChannelAuthorization, ChannelAuthorizer};
pub use broadcaster::{BroadcastEnvelope, BroadcastTransport, Broadcaster};
pub use events::{BookingStatusChanged, BroadcastEvent, NotificationCreated, TripReminder};
