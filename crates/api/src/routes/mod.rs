pub mod booking;
pub mod broadcasting;
pub mod notification;
