use async_trait::async_trait;
use bson::{DateTime, doc, oid::ObjectId};
use cocar_db::models::{Booking, BookingStatus, Conversation, Trip, TripStatus, User};
use mongodb::Database;

use super::base::{BaseDao, DaoResult};
use crate::repository::RideRepository;

/// Mongo-backed lookups over users, trips, bookings and conversations.
pub struct RideDao {
    pub users: BaseDao<User>,
    pub trips: BaseDao<Trip>,
    pub bookings: BaseDao<Booking>,
    pub conversations: BaseDao<Conversation>,
}

impl RideDao {
    pub fn new(db: &Database) -> Self {
        Self {
            users: BaseDao::new(db, User::COLLECTION),
            trips: BaseDao::new(db, Trip::COLLECTION),
            bookings: BaseDao::new(db, Booking::COLLECTION),
            conversations: BaseDao::new(db, Conversation::COLLECTION),
        }
    }
}

#[async_trait]
impl RideRepository for RideDao {
    async fn find_user(&self, id: ObjectId) -> DaoResult<Option<User>> {
        self.users.find_one(doc! { "_id": id }).await
    }

    async fn find_trip(&self, id: ObjectId) -> DaoResult<Option<Trip>> {
        self.trips.find_one(doc! { "_id": id }).await
    }

    async fn find_booking(&self, id: ObjectId) -> DaoResult<Option<Booking>> {
        self.bookings.find_one(doc! { "_id": id }).await
    }

    async fn find_active_booking(
        &self,
        trip_id: ObjectId,
        passenger_id: ObjectId,
    ) -> DaoResult<Option<Booking>> {
        self.bookings
            .find_one(doc! {
                "trip_id": trip_id,
                "passenger_id": passenger_id,
                "status": {
                    "$in": [BookingStatus::Pending.as_str(), BookingStatus::Confirmed.as_str()]
                },
            })
            .await
    }

    async fn find_conversation(&self, id: ObjectId) -> DaoResult<Option<Conversation>> {
        self.conversations.find_one(doc! { "_id": id }).await
    }

    async fn update_booking_status(
        &self,
        id: ObjectId,
        from: BookingStatus,
        to: BookingStatus,
    ) -> DaoResult<Option<Booking>> {
        let matched = self
            .bookings
            .update_one(
                doc! { "_id": id, "status": from.as_str() },
                doc! { "$set": { "status": to.as_str(), "updated_at": DateTime::now() } },
            )
            .await?;
        if !matched {
            return Ok(None);
        }
        self.bookings.find_by_id(id).await.map(Some)
    }

    async fn trips_departing_between(&self, from: DateTime, to: DateTime) -> DaoResult<Vec<Trip>> {
        self.trips
            .find_many(
                doc! {
                    "status": TripStatus::Scheduled.as_str(),
                    "departure_time": { "$gte": from, "$lt": to },
                },
                Some(doc! { "departure_time": 1 }),
            )
            .await
    }

    async fn bookings_for_trip(
        &self,
        trip_id: ObjectId,
        status: BookingStatus,
    ) -> DaoResult<Vec<Booking>> {
        self.bookings
            .find_many(
                doc! { "trip_id": trip_id, "status": status.as_str() },
                Some(doc! { "created_at": 1 }),
            )
            .await
    }
}
