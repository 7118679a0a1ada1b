use serde::{Deserialize, Serialize};

/// Client-visible names of the events pushed over private channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventName {
    #[serde(rename = "notification.new")]
    NotificationNew,
    #[serde(rename = "booking.status_changed")]
    BookingStatusChanged,
    #[serde(rename = "trip.reminder")]
    TripReminder,
}

impl EventName {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::NotificationNew => "notification.new",
            EventName::BookingStatusChanged => "booking.status_changed",
            EventName::TripReminder => "trip.reminder",
        }
    }

    /// Unknown names yield `None`; clients ignore events they do not handle.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "notification.new" => Some(EventName::NotificationNew),
            "booking.status_changed" => Some(EventName::BookingStatusChanged),
            "trip.reminder" => Some(EventName::TripReminder),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReminderType {
    #[serde(rename = "24_hours")]
    TwentyFourHours,
    #[serde(rename = "2_hours")]
    TwoHours,
    #[serde(rename = "departure")]
    Departure,
}

impl ReminderType {
    pub const ALL: [ReminderType; 3] = [
        ReminderType::TwentyFourHours,
        ReminderType::TwoHours,
        ReminderType::Departure,
    ];

    /// How long before departure the reminder fires.
    pub fn lead_secs(&self) -> i64 {
        match self {
            ReminderType::TwentyFourHours => 24 * 60 * 60,
            ReminderType::TwoHours => 2 * 60 * 60,
            ReminderType::Departure => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderType::TwentyFourHours => "24_hours",
            ReminderType::TwoHours => "2_hours",
            ReminderType::Departure => "departure",
        }
    }
}
