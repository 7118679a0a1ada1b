pub mod base;
pub mod notification;
pub mod ride;

pub use base::{BaseDao, DaoError, DaoResult};
pub use notification::NotificationDao;
pub use ride::RideDao;
