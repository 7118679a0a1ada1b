use bson::{DateTime, oid::ObjectId};
use cocar_db::models::{Booking, BookingStatus, Notification, Trip, User};
use cocar_protocol::{ChannelName, EventName, ReminderType};
use serde_json::{Value, json};

use crate::notification::NotificationView;

/// A payload-carrying message for one or more private channels.
pub trait BroadcastEvent {
    fn channels(&self) -> Vec<ChannelName>;
    fn event_name(&self) -> EventName;
    fn payload(&self) -> Value;
}

fn rfc3339(dt: DateTime) -> String {
    dt.try_to_rfc3339_string().unwrap_or_default()
}

fn id_hex(id: Option<ObjectId>) -> String {
    id.map(|id| id.to_hex()).unwrap_or_default()
}

fn trip_summary(trip: &Trip) -> Value {
    json!({
        "id": id_hex(trip.id),
        "origin": trip.origin,
        "destination": trip.destination,
        "departure_time": rfc3339(trip.departure_time),
    })
}

/// Fired after a booking moves to a new status.
pub struct BookingStatusChanged {
    pub booking: Booking,
    pub trip: Trip,
    pub passenger: Option<User>,
    pub old_status: BookingStatus,
}

impl BroadcastEvent for BookingStatusChanged {
    /// The passenger, and the driver when the trip has one.
    fn channels(&self) -> Vec<ChannelName> {
        let mut channels = vec![ChannelName::User(self.booking.passenger_id)];
        if let Some(driver_id) = self.trip.driver_id {
            if driver_id != self.booking.passenger_id {
                channels.push(ChannelName::User(driver_id));
            }
        }
        channels
    }

    fn event_name(&self) -> EventName {
        EventName::BookingStatusChanged
    }

    fn payload(&self) -> Value {
        let passenger = self.passenger.as_ref().map(|p| {
            json!({
                "id": id_hex(p.id),
                "name": p.name,
            })
        });

        json!({
            "booking_id": id_hex(self.booking.id),
            "old_status": self.old_status.as_str(),
            "new_status": self.booking.status.as_str(),
            "trip": trip_summary(&self.trip),
            "passenger": passenger,
            "seats": self.booking.seats,
            "total_price": self.booking.total_price,
            "updated_at": rfc3339(self.booking.updated_at),
        })
    }
}

/// Fired after a notification record is persisted.
pub struct NotificationCreated {
    pub notification: Notification,
}

impl BroadcastEvent for NotificationCreated {
    fn channels(&self) -> Vec<ChannelName> {
        vec![ChannelName::User(self.notification.user_id)]
    }

    fn event_name(&self) -> EventName {
        EventName::NotificationNew
    }

    /// The stored fields, plus a `read` mirror of `is_read` for older
    /// clients. This is the only place the mirror is produced.
    fn payload(&self) -> Value {
        let mut payload =
            serde_json::to_value(NotificationView::from(&self.notification)).unwrap_or(Value::Null);
        if let Value::Object(map) = &mut payload {
            map.insert("read".to_string(), Value::Bool(self.notification.is_read));
        }
        payload
    }
}

/// Fired by the reminder scheduler for one addressee of an upcoming trip.
pub struct TripReminder {
    pub user_id: ObjectId,
    pub trip: Trip,
    pub driver: Option<User>,
    pub reminder_type: ReminderType,
}

impl TripReminder {
    pub fn message(&self) -> String {
        let route = format!("{} to {}", self.trip.origin, self.trip.destination);
        match self.reminder_type {
            ReminderType::TwentyFourHours => format!("Your trip from {route} departs in 24 hours"),
            ReminderType::TwoHours => format!("Your trip from {route} departs in 2 hours"),
            ReminderType::Departure => format!("Your trip from {route} is departing now"),
        }
    }
}

impl BroadcastEvent for TripReminder {
    fn channels(&self) -> Vec<ChannelName> {
        vec![ChannelName::User(self.user_id)]
    }

    fn event_name(&self) -> EventName {
        EventName::TripReminder
    }

    fn payload(&self) -> Value {
        let driver = self.driver.as_ref().map(|d| {
            json!({
                "id": id_hex(d.id),
                "name": d.name,
                "phone": d.phone,
            })
        });

        json!({
            "trip_id": id_hex(self.trip.id),
            "origin": self.trip.origin,
            "destination": self.trip.destination,
            "departure_time": rfc3339(self.trip.departure_time),
            "reminder_type": self.reminder_type,
            "message": self.message(),
            "driver": driver,
        })
    }
}
