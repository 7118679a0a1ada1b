use chrono::Duration;
use cocar_config::{DatabaseBackend, Settings};
use cocar_db::{connect, indexes::ensure_indexes};
use cocar_services::{
    AuthService, BookingService, Broadcaster, ChannelAuthorizer, NotificationService,
    NotificationRepository, ReminderService, RideRepository,
    dao::{NotificationDao, RideDao},
    memory::{MemoryNotificationRepository, MemoryRideRepository},
};
use std::sync::Arc;
use tracing::warn;

use crate::ws::storage::WsStorage;

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub auth: Arc<AuthService>,
    pub notifications: Arc<NotificationService>,
    pub bookings: Arc<BookingService>,
    pub authorizer: Arc<ChannelAuthorizer>,
    pub reminders: Arc<ReminderService>,
    pub ws_storage: Arc<WsStorage>,
}

impl AppState {
    /// Builds the state on the backend named in `database.backend`.
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        match settings.database.backend {
            DatabaseBackend::Mongo => {
                let db = connect(&settings).await?;
                ensure_indexes(&db).await?;
                Ok(Self::with_repositories(
                    settings,
                    Arc::new(NotificationDao::new(&db)),
                    Arc::new(RideDao::new(&db)),
                ))
            }
            DatabaseBackend::Memory => {
                warn!("Using in-memory storage; nothing is persisted");
                Ok(Self::with_repositories(
                    settings,
                    Arc::new(MemoryNotificationRepository::new()),
                    Arc::new(MemoryRideRepository::new()),
                ))
            }
        }
    }

    /// Must be called inside a Tokio runtime: it starts the broadcast worker.
    pub fn with_repositories(
        settings: Settings,
        notification_repo: Arc<dyn NotificationRepository>,
        rides: Arc<dyn RideRepository>,
    ) -> Self {
        let auth = Arc::new(AuthService::new(settings.jwt.clone()));
        let ws_storage = Arc::new(WsStorage::new());
        let broadcaster = Broadcaster::spawn(ws_storage.clone(), settings.broadcast.queue_capacity);
        let notifications = Arc::new(NotificationService::new(
            notification_repo,
            broadcaster.clone(),
        ));
        let bookings = Arc::new(BookingService::new(
            rides.clone(),
            notifications.clone(),
            broadcaster.clone(),
        ));
        let authorizer = Arc::new(ChannelAuthorizer::new(rides.clone()));
        let reminders = Arc::new(ReminderService::new(
            rides,
            broadcaster,
            Duration::seconds(settings.reminders.interval_secs.max(1) as i64),
        ));

        Self {
            settings,
            auth,
            notifications,
            bookings,
            authorizer,
            reminders,
            ws_storage,
        }
    }
}
