//! Channel names, event names and the JSON messages exchanged over the
//! `/ws` endpoint. Both the server and `cocar-client` depend on this crate so
//! the two sides cannot drift apart.

pub mod channel;
pub mod event;
pub mod message;

pub use channel::{ChannelError, ChannelName};
pub use event::{EventName, ReminderType};
pub use message::{ClientMessage, ServerMessage};
