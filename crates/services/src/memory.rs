//! In-process repositories selected by `database.backend = "memory"`.
//! Nothing survives a restart; the integration tests run against these.

use async_trait::async_trait;
use bson::{DateTime, oid::ObjectId};
use cocar_db::models::{Booking, BookingStatus, Conversation, Notification, Trip, TripStatus, User};
use dashmap::DashMap;

use crate::dao::{DaoError, DaoResult};
use crate::repository::{NotificationRepository, RideRepository};

#[derive(Default)]
pub struct MemoryNotificationRepository {
    notifications: DashMap<ObjectId, Notification>,
}

impl MemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationRepository for MemoryNotificationRepository {
    async fn insert(&self, mut notification: Notification) -> DaoResult<Notification> {
        let id = ObjectId::new();
        notification.id = Some(id);
        self.notifications.insert(id, notification.clone());
        Ok(notification)
    }

    async fn list_for_user(&self, user_id: ObjectId) -> DaoResult<Vec<Notification>> {
        let mut items: Vec<Notification> = self
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .map(|n| n.value().clone())
            .collect();
        items.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(items)
    }

    async fn count_unread(&self, user_id: ObjectId) -> DaoResult<u64> {
        Ok(self
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count() as u64)
    }

    async fn mark_read(&self, user_id: ObjectId, id: ObjectId) -> DaoResult<Notification> {
        let mut entry = self
            .notifications
            .get_mut(&id)
            .filter(|n| n.user_id == user_id)
            .ok_or(DaoError::NotFound)?;
        if !entry.is_read {
            entry.is_read = true;
            entry.read_at = Some(DateTime::now());
        }
        Ok(entry.clone())
    }

    async fn mark_all_read(&self, user_id: ObjectId) -> DaoResult<u64> {
        let now = DateTime::now();
        let mut updated = 0;
        for mut entry in self.notifications.iter_mut() {
            if entry.user_id == user_id && !entry.is_read {
                entry.is_read = true;
                entry.read_at = Some(now);
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn delete(&self, user_id: ObjectId, id: ObjectId) -> DaoResult<bool> {
        Ok(self
            .notifications
            .remove_if(&id, |_, n| n.user_id == user_id)
            .is_some())
    }
}

#[derive(Default)]
pub struct MemoryRideRepository {
    users: DashMap<ObjectId, User>,
    trips: DashMap<ObjectId, Trip>,
    bookings: DashMap<ObjectId, Booking>,
    conversations: DashMap<ObjectId, Conversation>,
}

impl MemoryRideRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, mut user: User) -> ObjectId {
        let id = *user.id.get_or_insert_with(ObjectId::new);
        self.users.insert(id, user);
        id
    }

    pub fn insert_trip(&self, mut trip: Trip) -> ObjectId {
        let id = *trip.id.get_or_insert_with(ObjectId::new);
        self.trips.insert(id, trip);
        id
    }

    pub fn insert_booking(&self, mut booking: Booking) -> ObjectId {
        let id = *booking.id.get_or_insert_with(ObjectId::new);
        self.bookings.insert(id, booking);
        id
    }

    pub fn insert_conversation(&self, mut conversation: Conversation) -> ObjectId {
        let id = *conversation.id.get_or_insert_with(ObjectId::new);
        self.conversations.insert(id, conversation);
        id
    }
}

#[async_trait]
impl RideRepository for MemoryRideRepository {
    async fn find_user(&self, id: ObjectId) -> DaoResult<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn find_trip(&self, id: ObjectId) -> DaoResult<Option<Trip>> {
        Ok(self.trips.get(&id).map(|t| t.clone()))
    }

    async fn find_booking(&self, id: ObjectId) -> DaoResult<Option<Booking>> {
        Ok(self.bookings.get(&id).map(|b| b.clone()))
    }

    async fn find_active_booking(
        &self,
        trip_id: ObjectId,
        passenger_id: ObjectId,
    ) -> DaoResult<Option<Booking>> {
        Ok(self
            .bookings
            .iter()
            .find(|b| {
                b.trip_id == trip_id && b.passenger_id == passenger_id && b.status.is_active()
            })
            .map(|b| b.value().clone()))
    }

    async fn find_conversation(&self, id: ObjectId) -> DaoResult<Option<Conversation>> {
        Ok(self.conversations.get(&id).map(|c| c.clone()))
    }

    async fn update_booking_status(
        &self,
        id: ObjectId,
        from: BookingStatus,
        to: BookingStatus,
    ) -> DaoResult<Option<Booking>> {
        let Some(mut booking) = self.bookings.get_mut(&id) else {
            return Ok(None);
        };
        if booking.status != from {
            return Ok(None);
        }
        booking.status = to;
        booking.updated_at = DateTime::now();
        Ok(Some(booking.clone()))
    }

    async fn trips_departing_between(&self, from: DateTime, to: DateTime) -> DaoResult<Vec<Trip>> {
        let mut trips: Vec<Trip> = self
            .trips
            .iter()
            .filter(|t| {
                t.status == TripStatus::Scheduled
                    && t.departure_time >= from
                    && t.departure_time < to
            })
            .map(|t| t.value().clone())
            .collect();
        trips.sort_by_key(|t| t.departure_time);
        Ok(trips)
    }

    async fn bookings_for_trip(
        &self,
        trip_id: ObjectId,
        status: BookingStatus,
    ) -> DaoResult<Vec<Booking>> {
        let mut bookings: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|b| b.trip_id == trip_id && b.status == status)
            .map(|b| b.value().clone())
            .collect();
        bookings.sort_by_key(|b| b.created_at);
        Ok(bookings)
    }
}
