use bson::{DateTime, oid::ObjectId};
use chrono::{Duration, Utc};
use cocar_db::models::{BookingStatus, Trip};
use cocar_protocol::ReminderType;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::broadcast::{Broadcaster, TripReminder};
use crate::dao::DaoResult;
use crate::repository::RideRepository;

/// Sends `trip.reminder` events to drivers and confirmed passengers as a
/// trip's departure approaches.
///
/// Each tick covers the window `[now + lead - tick, now + lead)` for every
/// reminder type, so consecutive ticks tile the timeline. The `sent` map keeps
/// a (trip, user, type) from being reminded twice in one process.
pub struct ReminderService {
    rides: Arc<dyn RideRepository>,
    broadcaster: Broadcaster,
    tick: Duration,
    sent: DashMap<(ObjectId, ObjectId, ReminderType), DateTime>,
}

impl ReminderService {
    pub fn new(rides: Arc<dyn RideRepository>, broadcaster: Broadcaster, tick: Duration) -> Self {
        Self {
            rides,
            broadcaster,
            tick,
            sent: DashMap::new(),
        }
    }

    /// Emits every reminder that falls due in the tick ending at `now`.
    /// Returns how many were sent.
    pub async fn dispatch_due(&self, now: chrono::DateTime<Utc>) -> DaoResult<usize> {
        let mut sent = 0;

        for reminder_type in ReminderType::ALL {
            let to = now + Duration::seconds(reminder_type.lead_secs());
            let from = to - self.tick;
            let trips = self
                .rides
                .trips_departing_between(DateTime::from_chrono(from), DateTime::from_chrono(to))
                .await?;

            for trip in trips {
                sent += self.remind_trip(&trip, reminder_type).await?;
            }
        }

        self.forget_departed(now);
        Ok(sent)
    }

    async fn remind_trip(&self, trip: &Trip, reminder_type: ReminderType) -> DaoResult<usize> {
        let Some(trip_id) = trip.id else {
            return Ok(0);
        };

        let mut recipients: Vec<ObjectId> = self
            .rides
            .bookings_for_trip(trip_id, BookingStatus::Confirmed)
            .await?
            .into_iter()
            .map(|b| b.passenger_id)
            .collect();
        let driver = match trip.driver_id {
            Some(driver_id) => {
                recipients.push(driver_id);
                self.rides.find_user(driver_id).await?
            }
            None => None,
        };

        let mut sent = 0;
        for user_id in recipients {
            if self
                .sent
                .insert((trip_id, user_id, reminder_type), trip.departure_time)
                .is_some()
            {
                continue;
            }

            self.broadcaster.emit(&TripReminder {
                user_id,
                trip: trip.clone(),
                driver: driver.clone(),
                reminder_type,
            });
            sent += 1;
        }

        if sent > 0 {
            info!(?trip_id, reminder = reminder_type.as_str(), sent, "Trip reminders sent");
        }
        Ok(sent)
    }

    /// Drops bookkeeping for trips that left more than a tick ago; no
    /// window can reach them any more.
    fn forget_departed(&self, now: chrono::DateTime<Utc>) {
        let horizon = DateTime::from_chrono(now - self.tick);
        self.sent.retain(|_, departure| *departure >= horizon);
    }

    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        let period = self.tick.to_std().unwrap_or(std::time::Duration::from_secs(60));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                match self.dispatch_due(Utc::now()).await {
                    Ok(sent) => debug!(sent, "Reminder tick"),
                    Err(e) => warn!(%e, "Reminder tick failed"),
                }
            }
        })
    }
}
