use serde::Serialize;
use serde_json::Value;

/// A notification as the client holds it. `is_read` is the only read flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientNotification {
    pub id: String,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub data: Value,
    pub is_read: bool,
    pub read_at: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Replace everything with a server snapshot.
    Load(Vec<ClientNotification>),
    /// A pushed notification; ignored when its id is already present.
    ReceivePush(ClientNotification),
    /// Marks one notification read at `read_at` (RFC 3339).
    MarkRead { id: String, read_at: String },
    MarkAllRead { read_at: String },
    Delete(String),
}

/// Newest-first notification list. The unread count is derived from the
/// list, so the two never disagree.
#[derive(Debug, Clone, Default)]
pub struct NotificationState {
    notifications: Vec<ClientNotification>,
}

impl NotificationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> &[ClientNotification] {
        &self.notifications
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.is_read).count()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.notifications.iter().any(|n| n.id == id)
    }

    /// Applies `action` and reports whether anything changed.
    pub fn reduce(&mut self, action: Action) -> bool {
        match action {
            Action::Load(notifications) => {
                self.notifications = notifications;
                true
            }
            Action::ReceivePush(notification) => {
                if self.contains(&notification.id) {
                    return false;
                }
                self.notifications.insert(0, notification);
                true
            }
            Action::MarkRead { id, read_at } => {
                match self.notifications.iter_mut().find(|n| n.id == id) {
                    Some(n) if !n.is_read => {
                        n.is_read = true;
                        n.read_at = Some(read_at);
                        true
                    }
                    _ => false,
                }
            }
            Action::MarkAllRead { read_at } => {
                let mut changed = false;
                for n in self.notifications.iter_mut().filter(|n| !n.is_read) {
                    n.is_read = true;
                    n.read_at = Some(read_at.clone());
                    changed = true;
                }
                changed
            }
            Action::Delete(id) => {
                let before = self.notifications.len();
                self.notifications.retain(|n| n.id != id);
                self.notifications.len() != before
            }
        }
    }
}
