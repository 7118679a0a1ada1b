use bson::{DateTime, oid::ObjectId};
use cocar_db::models::{Notification, NotificationType};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::broadcast::{Broadcaster, NotificationCreated};
use crate::dao::DaoResult;
use crate::repository::NotificationRepository;

/// JSON shape of a notification for API responses and push payloads.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationView {
    pub id: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
    pub is_read: bool,
    pub read_at: Option<String>,
    pub created_at: String,
}

impl From<&Notification> for NotificationView {
    fn from(n: &Notification) -> Self {
        Self {
            id: n.id.map(|id| id.to_hex()).unwrap_or_default(),
            notification_type: n.notification_type,
            title: n.title.clone(),
            message: n.message.clone(),
            data: n.data.clone(),
            is_read: n.is_read,
            read_at: n.read_at.and_then(|t| t.try_to_rfc3339_string().ok()),
            created_at: n.created_at.try_to_rfc3339_string().unwrap_or_default(),
        }
    }
}

pub struct NotificationService {
    repo: Arc<dyn NotificationRepository>,
    broadcaster: Broadcaster,
}

impl NotificationService {
    pub fn new(repo: Arc<dyn NotificationRepository>, broadcaster: Broadcaster) -> Self {
        Self { repo, broadcaster }
    }

    /// Persists a notification for `user_id` and pushes it to their channel.
    pub async fn notify(
        &self,
        user_id: ObjectId,
        notification_type: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
        data: serde_json::Value,
    ) -> DaoResult<Notification> {
        let notification = self
            .repo
            .insert(Notification {
                id: None,
                user_id,
                notification_type,
                title: title.into(),
                message: message.into(),
                data,
                is_read: false,
                read_at: None,
                created_at: DateTime::now(),
            })
            .await?;

        info!(
            ?user_id,
            id = ?notification.id,
            kind = notification_type.as_str(),
            "Notification created"
        );
        self.broadcaster.emit(&NotificationCreated {
            notification: notification.clone(),
        });

        Ok(notification)
    }

    pub async fn list(&self, user_id: ObjectId) -> DaoResult<Vec<Notification>> {
        self.repo.list_for_user(user_id).await
    }

    pub async fn unread_count(&self, user_id: ObjectId) -> DaoResult<u64> {
        self.repo.count_unread(user_id).await
    }

    pub async fn mark_read(&self, user_id: ObjectId, id: ObjectId) -> DaoResult<Notification> {
        self.repo.mark_read(user_id, id).await
    }

    pub async fn mark_all_read(&self, user_id: ObjectId) -> DaoResult<u64> {
        let updated = self.repo.mark_all_read(user_id).await?;
        debug!(?user_id, updated, "Marked all notifications read");
        Ok(updated)
    }

    pub async fn delete(&self, user_id: ObjectId, id: ObjectId) -> DaoResult<bool> {
        self.repo.delete(user_id, id).await
    }
}
