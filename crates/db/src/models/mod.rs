mod booking;
mod conversation;
mod notification;
mod trip;
mod user;

pub use booking::{Booking, BookingStatus};
pub use conversation::Conversation;
pub use notification::{Notification, NotificationType};
pub use trip::{Trip, TripStatus};
pub use user::User;
