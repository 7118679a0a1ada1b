use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Messages a client sends over the socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    /// `channel` is kept raw so an unparseable name can be echoed back in
    /// the denial.
    Subscribe { channel: String },
    Unsubscribe { channel: String },
    Ping,
}

/// Messages the server sends over the socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    Connected {
        connection_id: String,
        user_id: String,
    },
    SubscriptionSucceeded {
        channel: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        channel_data: Option<Value>,
    },
    /// Denials carry no reason.
    SubscriptionError { channel: String },
    Event {
        channel: String,
        event: String,
        data: Value,
    },
    Pong,
}
