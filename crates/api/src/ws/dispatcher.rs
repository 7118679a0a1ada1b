use async_trait::async_trait;
use axum::extract::ws::Message;
use cocar_protocol::ServerMessage;
use cocar_services::broadcast::{BroadcastEnvelope, BroadcastTransport};
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use super::storage::{WsSender, WsStorage};

/// Queues a frame on one connection without waiting. A connection that is not
/// draining its buffer loses the frame.
fn push(connection_id: &str, sender: &WsSender, message: Message) -> bool {
    match sender.try_send(message) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            warn!(%connection_id, "Outbound buffer full, dropping WS message");
            false
        }
        Err(TrySendError::Closed(_)) => {
            debug!(%connection_id, "Writer gone, dropping WS message");
            false
        }
    }
}

/// Sends a message to one connection. Returns whether it was queued.
pub fn send_to_connection(
    ws_storage: &WsStorage,
    connection_id: &str,
    message: &ServerMessage,
) -> bool {
    let Some(sender) = ws_storage.sender(connection_id) else {
        return false;
    };
    match serde_json::to_string(message) {
        Ok(text) => push(connection_id, &sender, Message::text(text)),
        Err(e) => {
            warn!(%connection_id, %e, "Failed to encode WS message");
            false
        }
    }
}

/// Queues an envelope for every connection subscribed to its channel.
pub fn broadcast(ws_storage: &WsStorage, envelope: &BroadcastEnvelope) -> usize {
    let message = ServerMessage::Event {
        channel: envelope.channel.to_string(),
        event: envelope.event.as_str().to_string(),
        data: envelope.payload.clone(),
    };
    let text = match serde_json::to_string(&message) {
        Ok(text) => text,
        Err(e) => {
            warn!(channel = %envelope.channel, %e, "Failed to encode broadcast");
            return 0;
        }
    };

    ws_storage
        .subscribers(&envelope.channel)
        .into_iter()
        .filter(|(connection_id, sender)| push(connection_id, sender, Message::text(text.clone())))
        .count()
}

#[async_trait]
impl BroadcastTransport for WsStorage {
    async fn deliver(&self, envelope: &BroadcastEnvelope) -> usize {
        broadcast(self, envelope)
    }
}
