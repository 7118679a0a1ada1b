use serde::Deserialize;
use serde_json::Value;

use crate::store::ClientNotification;

/// A notification as it arrives from the server, over REST or a push.
///
/// Pushes carry both `read` and `is_read`; older payloads carry either one
/// or neither. Both are accepted and collapse to `is_read`, missing means
/// unread.
#[derive(Debug, Clone, Deserialize)]
pub struct WireNotification {
    pub id: String,
    #[serde(rename = "type", default)]
    pub notification_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub is_read: Option<bool>,
    #[serde(default)]
    pub read: Option<bool>,
    #[serde(default)]
    pub read_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl From<WireNotification> for ClientNotification {
    fn from(w: WireNotification) -> Self {
        Self {
            id: w.id,
            notification_type: w.notification_type,
            title: w.title,
            message: w.message,
            data: w.data,
            is_read: w.is_read.or(w.read).unwrap_or(false),
            read_at: w.read_at,
            created_at: w.created_at,
        }
    }
}
