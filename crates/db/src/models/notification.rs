use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    /// Opaque to the server; whatever the producing domain action attached.
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub is_read: bool,
    pub read_at: Option<DateTime>,
    pub created_at: DateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    BookingRequested,
    BookingConfirmed,
    BookingRejected,
    BookingCancelled,
    BookingCompleted,
    TripReminder,
    NewMessage,
    RatingReceived,
    PaymentReceived,
    System,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::BookingRequested => "booking_requested",
            NotificationType::BookingConfirmed => "booking_confirmed",
            NotificationType::BookingRejected => "booking_rejected",
            NotificationType::BookingCancelled => "booking_cancelled",
            NotificationType::BookingCompleted => "booking_completed",
            NotificationType::TripReminder => "trip_reminder",
            NotificationType::NewMessage => "new_message",
            NotificationType::RatingReceived => "rating_received",
            NotificationType::PaymentReceived => "payment_received",
            NotificationType::System => "system",
        }
    }
}

impl Notification {
    pub const COLLECTION: &'static str = "notifications";
}
