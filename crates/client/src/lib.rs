//! Client side of CoCar notifications.
//!
//! [`Subscriber`] owns a [`NotificationState`] and keeps it current: pushes
//! arrive on the user's private channel, REST fills the gaps. All local
//! mutations go through [`NotificationState::reduce`].

pub mod api;
pub mod error;
pub mod store;
pub mod subscriber;
pub mod toast;
pub mod wire;

pub use api::NotificationApi;
pub use error::ClientError;
pub use store::{Action, ClientNotification, NotificationState};
pub use subscriber::{ConnectionState, Session, Subscriber, SubscriberConfig};
pub use toast::{Toast, ToastKind};
pub use wire::WireNotification;
