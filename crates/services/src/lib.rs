pub mod auth;
pub mod booking;
pub mod broadcast;
pub mod dao;
pub mod memory;
pub mod notification;
pub mod reminder;
pub mod repository;

pub use auth::AuthService;
pub use booking::{BookingError, BookingService};
pub use broadcast::{Broadcaster, ChannelAuthorization, ChannelAuthorizer};
pub use dao::*;
pub use notification::NotificationService;
pub use reminder::ReminderService;
pub use repository::{NotificationRepository, RideRepository};
