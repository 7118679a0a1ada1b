use axum::extract::ws::Message;
use bson::oid::ObjectId;
use cocar_protocol::ChannelName;
use dashmap::DashMap;
use std::collections::HashSet;
use tokio::sync::mpsc;
use tracing::debug;

/// Feeds the connection's writer task.
pub type WsSender = mpsc::Sender<Message>;

struct Connection {
    user_id: ObjectId,
    sender: WsSender,
    channels: HashSet<ChannelName>,
}

/// Tracks active WebSocket connections and the private channels each one
/// subscribed to. A user may hold several connections (tabs, devices).
pub struct WsStorage {
    connections: DashMap<String, Connection>,
    subscriptions: DashMap<ChannelName, HashSet<String>>,
}

impl WsStorage {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            subscriptions: DashMap::new(),
        }
    }

    pub fn add(&self, connection_id: String, user_id: ObjectId, sender: WsSender) {
        self.connections.insert(
            connection_id,
            Connection {
                user_id,
                sender,
                channels: HashSet::new(),
            },
        );
    }

    /// Drops the connection and every subscription it held.
    pub fn remove(&self, connection_id: &str) {
        let Some((_, connection)) = self.connections.remove(connection_id) else {
            return;
        };
        for channel in &connection.channels {
            self.detach(channel, connection_id);
        }
        debug!(
            user_id = ?connection.user_id,
            %connection_id,
            channels = connection.channels.len(),
            "Connection removed"
        );
    }

    /// Returns `false` if the connection is unknown or already subscribed.
    pub fn subscribe(&self, connection_id: &str, channel: ChannelName) -> bool {
        let Some(mut connection) = self.connections.get_mut(connection_id) else {
            return false;
        };
        if !connection.channels.insert(channel) {
            return false;
        }
        drop(connection);

        self.subscriptions
            .entry(channel)
            .or_default()
            .insert(connection_id.to_string());
        true
    }

    pub fn unsubscribe(&self, connection_id: &str, channel: &ChannelName) -> bool {
        let removed = self
            .connections
            .get_mut(connection_id)
            .map(|mut c| c.channels.remove(channel))
            .unwrap_or(false);
        if removed {
            self.detach(channel, connection_id);
        }
        removed
    }

    fn detach(&self, channel: &ChannelName, connection_id: &str) {
        if let Some(mut members) = self.subscriptions.get_mut(channel) {
            members.remove(connection_id);
        }
        self.subscriptions.remove_if(channel, |_, members| members.is_empty());
    }

    pub fn sender(&self, connection_id: &str) -> Option<WsSender> {
        self.connections.get(connection_id).map(|c| c.sender.clone())
    }

    /// Connection ids and senders currently subscribed to `channel`.
    pub fn subscribers(&self, channel: &ChannelName) -> Vec<(String, WsSender)> {
        let ids: Vec<String> = self
            .subscriptions
            .get(channel)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default();

        ids.into_iter()
            .filter_map(|id| self.sender(&id).map(|sender| (id, sender)))
            .collect()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

impl Default for WsStorage {
    fn default() -> Self {
        Self::new()
    }
}
