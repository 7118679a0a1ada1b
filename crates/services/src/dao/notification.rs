use async_trait::async_trait;
use bson::{DateTime, doc, oid::ObjectId};
use cocar_db::models::Notification;
use mongodb::Database;

use super::base::{BaseDao, DaoError, DaoResult};
use crate::repository::NotificationRepository;

pub struct NotificationDao {
    pub base: BaseDao<Notification>,
}

impl NotificationDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Notification::COLLECTION),
        }
    }
}

#[async_trait]
impl NotificationRepository for NotificationDao {
    async fn insert(&self, mut notification: Notification) -> DaoResult<Notification> {
        notification.id = None;
        let id = self.base.insert_one(&notification).await?;
        notification.id = Some(id);
        Ok(notification)
    }

    async fn list_for_user(&self, user_id: ObjectId) -> DaoResult<Vec<Notification>> {
        self.base
            .find_many(
                doc! { "user_id": user_id },
                Some(doc! { "created_at": -1, "_id": -1 }),
            )
            .await
    }

    async fn count_unread(&self, user_id: ObjectId) -> DaoResult<u64> {
        self.base
            .count(doc! { "user_id": user_id, "is_read": false })
            .await
    }

    async fn mark_read(&self, user_id: ObjectId, id: ObjectId) -> DaoResult<Notification> {
        // Only unread documents are touched so read_at keeps its first value.
        self.base
            .update_one(
                doc! { "_id": id, "user_id": user_id, "is_read": false },
                doc! { "$set": { "is_read": true, "read_at": DateTime::now() } },
            )
            .await?;

        self.base
            .find_one(doc! { "_id": id, "user_id": user_id })
            .await?
            .ok_or(DaoError::NotFound)
    }

    async fn mark_all_read(&self, user_id: ObjectId) -> DaoResult<u64> {
        self.base
            .update_many(
                doc! { "user_id": user_id, "is_read": false },
                doc! { "$set": { "is_read": true, "read_at": DateTime::now() } },
            )
            .await
    }

    async fn delete(&self, user_id: ObjectId, id: ObjectId) -> DaoResult<bool> {
        let deleted = self
            .base
            .hard_delete(doc! { "_id": id, "user_id": user_id })
            .await?;
        Ok(deleted > 0)
    }
}
