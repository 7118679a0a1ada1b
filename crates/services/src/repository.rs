use async_trait::async_trait;
use bson::{DateTime, oid::ObjectId};
use cocar_db::models::{Booking, BookingStatus, Conversation, Notification, Trip, User};

use crate::dao::DaoResult;

/// Storage for notification records. Every read and write past `insert` is
/// scoped to the owning user; a notification owned by someone else behaves as
/// if it did not exist.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert(&self, notification: Notification) -> DaoResult<Notification>;

    /// Newest first.
    async fn list_for_user(&self, user_id: ObjectId) -> DaoResult<Vec<Notification>>;

    async fn count_unread(&self, user_id: ObjectId) -> DaoResult<u64>;

    /// Idempotent: marking an already-read notification keeps its `read_at`.
    async fn mark_read(&self, user_id: ObjectId, id: ObjectId) -> DaoResult<Notification>;

    /// Returns how many notifications changed.
    async fn mark_all_read(&self, user_id: ObjectId) -> DaoResult<u64>;

    async fn delete(&self, user_id: ObjectId, id: ObjectId) -> DaoResult<bool>;
}

/// Read access to the marketplace entities the notification flow needs, plus
/// the one write it performs (booking status).
#[async_trait]
pub trait RideRepository: Send + Sync {
    async fn find_user(&self, id: ObjectId) -> DaoResult<Option<User>>;

    async fn find_trip(&self, id: ObjectId) -> DaoResult<Option<Trip>>;

    async fn find_booking(&self, id: ObjectId) -> DaoResult<Option<Booking>>;

    /// A pending or confirmed booking of `passenger_id` on `trip_id`.
    async fn find_active_booking(
        &self,
        trip_id: ObjectId,
        passenger_id: ObjectId,
    ) -> DaoResult<Option<Booking>>;

    async fn find_conversation(&self, id: ObjectId) -> DaoResult<Option<Conversation>>;

    /// Moves the booking from `from` to `to` only if it is still `from`.
    /// `None` when it changed in the meantime (or is gone).
    async fn update_booking_status(
        &self,
        id: ObjectId,
        from: BookingStatus,
        to: BookingStatus,
    ) -> DaoResult<Option<Booking>>;

    /// Scheduled trips with `from <= departure_time < to`, earliest first.
    async fn trips_departing_between(&self, from: DateTime, to: DateTime) -> DaoResult<Vec<Trip>>;

    async fn bookings_for_trip(
        &self,
        trip_id: ObjectId,
        status: BookingStatus,
    ) -> DaoResult<Vec<Booking>>;
}
