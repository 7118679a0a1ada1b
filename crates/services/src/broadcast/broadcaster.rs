use async_trait::async_trait;
use cocar_protocol::{ChannelName, EventName};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use super::events::BroadcastEvent;

/// One event addressed to one channel, ready for the transport.
#[derive(Debug, Clone, Serialize)]
pub struct BroadcastEnvelope {
    pub channel: ChannelName,
    pub event: EventName,
    pub payload: serde_json::Value,
}

/// Whatever pushes envelopes to connected subscribers.
#[async_trait]
pub trait BroadcastTransport: Send + Sync + 'static {
    /// Returns how many connections received the envelope.
    async fn deliver(&self, envelope: &BroadcastEnvelope) -> usize;
}

/// Cheap to clone; all clones feed the same queue.
#[derive(Clone)]
pub struct Broadcaster {
    tx: mpsc::Sender<BroadcastEnvelope>,
}

impl Broadcaster {
    /// Starts the delivery task draining the queue into `transport`.
    pub fn spawn(transport: Arc<dyn BroadcastTransport>, capacity: usize) -> Self {
        let (broadcaster, mut rx) = Self::channel(capacity);

        tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                let reached = transport.deliver(&envelope).await;
                debug!(
                    channel = %envelope.channel,
                    event = envelope.event.as_str(),
                    reached,
                    "Broadcast delivered"
                );
            }
            debug!("Broadcast queue closed");
        });

        broadcaster
    }

    /// A broadcaster whose queue the caller drains.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<BroadcastEnvelope>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    pub fn emit<E: BroadcastEvent>(&self, event: &E) {
        let name = event.event_name();
        let payload = event.payload();

        for channel in event.channels() {
            self.enqueue(BroadcastEnvelope {
                channel,
                event: name,
                payload: payload.clone(),
            });
        }
    }

    fn enqueue(&self, envelope: BroadcastEnvelope) {
        match self.tx.try_send(envelope) {
            Ok(()) => {}
            Err(TrySendError::Full(envelope)) => {
                warn!(
                    channel = %envelope.channel,
                    event = envelope.event.as_str(),
                    "Broadcast queue full, dropping event"
                );
            }
            Err(TrySendError::Closed(envelope)) => {
                warn!(
                    channel = %envelope.channel,
                    event = envelope.event.as_str(),
                    "Broadcast worker gone, dropping event"
                );
            }
        }
    }
}
