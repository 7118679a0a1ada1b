use bson::oid::ObjectId;
use cocar_db::models::{Booking, BookingStatus, NotificationType, Trip};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::broadcast::{BookingStatusChanged, Broadcaster};
use crate::dao::DaoError;
use crate::notification::NotificationService;
use crate::repository::RideRepository;

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Booking not found")]
    NotFound,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Cannot move booking from {from} to {to}")]
    InvalidTransition { from: &'static str, to: &'static str },
    #[error("Booking changed while updating; reload and retry")]
    Conflict,
    #[error(transparent)]
    Dao(#[from] DaoError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Actor {
    Driver,
    Passenger,
}

fn transition_allowed(actor: Actor, from: BookingStatus, to: BookingStatus) -> bool {
    use BookingStatus::*;
    match actor {
        Actor::Driver => matches!(
            (from, to),
            (Pending, Confirmed) | (Pending, Rejected) | (Confirmed, Completed)
        ),
        Actor::Passenger => matches!((from, to), (Pending, Cancelled) | (Confirmed, Cancelled)),
    }
}

/// Booking status changes and the notifications they fan out to.
pub struct BookingService {
    rides: Arc<dyn RideRepository>,
    notifications: Arc<NotificationService>,
    broadcaster: Broadcaster,
}

impl BookingService {
    pub fn new(
        rides: Arc<dyn RideRepository>,
        notifications: Arc<NotificationService>,
        broadcaster: Broadcaster,
    ) -> Self {
        Self {
            rides,
            notifications,
            broadcaster,
        }
    }

    pub async fn change_status(
        &self,
        booking_id: ObjectId,
        actor_id: ObjectId,
        new_status: BookingStatus,
    ) -> Result<Booking, BookingError> {
        let booking = self
            .rides
            .find_booking(booking_id)
            .await?
            .ok_or(BookingError::NotFound)?;
        let trip = self
            .rides
            .find_trip(booking.trip_id)
            .await?
            .ok_or(BookingError::NotFound)?;

        let actor = if trip.driver_id == Some(actor_id) {
            Actor::Driver
        } else if booking.passenger_id == actor_id {
            Actor::Passenger
        } else {
            return Err(BookingError::Forbidden(
                "Not a participant of this booking".to_string(),
            ));
        };

        let old_status = booking.status;
        if !transition_allowed(actor, old_status, new_status) {
            return Err(BookingError::InvalidTransition {
                from: old_status.as_str(),
                to: new_status.as_str(),
            });
        }

        let updated = self
            .rides
            .update_booking_status(booking_id, old_status, new_status)
            .await?
            .ok_or(BookingError::Conflict)?;
        info!(
            ?booking_id,
            ?actor_id,
            from = old_status.as_str(),
            to = new_status.as_str(),
            "Booking status changed"
        );

        let passenger = self.rides.find_user(updated.passenger_id).await?;
        self.broadcaster.emit(&BookingStatusChanged {
            booking: updated.clone(),
            trip: trip.clone(),
            passenger,
            old_status,
        });

        self.notify_counterpart(actor, &updated, &trip).await;

        Ok(updated)
    }

    /// Failures here are logged; the status change itself already happened.
    async fn notify_counterpart(&self, actor: Actor, booking: &Booking, trip: &Trip) {
        let route = format!("{} → {}", trip.origin, trip.destination);
        let (recipient, kind, title, message) = match (actor, booking.status) {
            (Actor::Driver, BookingStatus::Confirmed) => (
                Some(booking.passenger_id),
                NotificationType::BookingConfirmed,
                "Booking confirmed",
                format!("Your seat on {route} is confirmed"),
            ),
            (Actor::Driver, BookingStatus::Rejected) => (
                Some(booking.passenger_id),
                NotificationType::BookingRejected,
                "Booking rejected",
                format!("The driver declined your booking on {route}"),
            ),
            (Actor::Driver, BookingStatus::Completed) => (
                Some(booking.passenger_id),
                NotificationType::BookingCompleted,
                "Trip completed",
                format!("Your trip {route} is complete. Don't forget to rate your driver"),
            ),
            (Actor::Passenger, BookingStatus::Cancelled) => (
                trip.driver_id,
                NotificationType::BookingCancelled,
                "Booking cancelled",
                format!("A passenger cancelled {} seat(s) on {route}", booking.seats),
            ),
            _ => return,
        };

        let Some(recipient) = recipient else {
            return;
        };

        let data = json!({
            "booking_id": booking.id.map(|id| id.to_hex()),
            "trip_id": booking.trip_id.to_hex(),
            "status": booking.status.as_str(),
        });
        if let Err(e) = self
            .notifications
            .notify(recipient, kind, title, message, data)
            .await
        {
            warn!(
                ?recipient,
                booking_id = ?booking.id,
                %e,
                "Failed to create booking notification"
            );
        }
    }
}
