use bson::oid::ObjectId;
use chrono::{SecondsFormat, Utc};
use cocar_protocol::{ChannelName, ClientMessage, EventName, ServerMessage};
use futures::{SinkExt, StreamExt};
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, RwLock, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::api::NotificationApi;
use crate::error::{ClientError, ClientResult};
use crate::store::{Action, ClientNotification, NotificationState};
use crate::toast::Toast;
use crate::wire::WireNotification;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Who the subscriber acts for.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    /// Base URL of the REST API, e.g. `http://127.0.0.1:3000`.
    pub api_url: String,
    /// WebSocket endpoint, e.g. `ws://127.0.0.1:3000/ws`.
    pub ws_url: String,
    /// How long a `booking.status_changed` waits before refetching.
    pub refetch_delay: Duration,
}

impl SubscriberConfig {
    pub fn new(api_url: impl Into<String>, ws_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ws_url: ws_url.into(),
            refetch_delay: Duration::from_secs(1),
        }
    }
}

/// State reachable from the reader task.
struct Shared {
    state: RwLock<NotificationState>,
    connection: watch::Sender<ConnectionState>,
    toasts: mpsc::UnboundedSender<Toast>,
    refetch_delay: Duration,
    pending_refetch: Mutex<Option<JoinHandle<()>>>,
}

impl Shared {
    fn set_connection(&self, state: ConnectionState) {
        let previous = self.connection.send_replace(state);
        if previous != state {
            debug!(?previous, current = ?state, "Connection state changed");
        }
    }

    async fn fetch_notifications(&self, api: &NotificationApi) {
        match api.list().await {
            Ok(items) => {
                let count = items.len();
                self.state.write().await.reduce(Action::Load(items));
                debug!(count, "Notifications loaded");
            }
            Err(e) => warn!(%e, "Failed to fetch notifications"),
        }
    }

    async fn fetch_unread_count(&self, api: &NotificationApi) -> Option<u64> {
        match api.unread_count().await {
            Ok(server) => {
                let local = self.state.read().await.unread_count() as u64;
                if local != server {
                    debug!(server, local, "Server unread count differs from local list");
                }
                Some(server)
            }
            Err(e) => {
                warn!(%e, "Failed to fetch unread count");
                None
            }
        }
    }

    async fn refresh(&self, api: &NotificationApi) {
        self.fetch_notifications(api).await;
        self.fetch_unread_count(api).await;
    }

    /// Returns `false` when the subscription is over.
    async fn on_server_message(
        self: &Arc<Self>,
        api: &NotificationApi,
        channel: &str,
        message: ServerMessage,
    ) -> bool {
        match message {
            ServerMessage::Connected { connection_id, .. } => {
                debug!(%connection_id, "Socket accepted");
            }
            ServerMessage::SubscriptionSucceeded { channel: c, .. } if c == channel => {
                self.set_connection(ConnectionState::Connected);
                info!(%channel, "Subscribed to notifications");
            }
            ServerMessage::SubscriptionError { channel: c } => {
                warn!(channel = %c, "Subscription rejected");
                return c != channel;
            }
            ServerMessage::Event {
                channel: c,
                event,
                data,
            } if c == channel => {
                self.handle_event(api, &event, data).await;
            }
            other => debug!(?other, "Ignoring server message"),
        }
        true
    }

    async fn handle_event(self: &Arc<Self>, api: &NotificationApi, event: &str, data: Value) {
        match EventName::parse(event) {
            Some(EventName::NotificationNew) => self.on_notification(data).await,
            Some(EventName::BookingStatusChanged) => {
                debug!(booking_id = %data["booking_id"], "Booking status changed");
                self.schedule_refetch(api.clone()).await;
            }
            Some(EventName::TripReminder) => {
                info!(
                    trip_id = %data["trip_id"],
                    reminder = %data["reminder_type"],
                    message = %data["message"],
                    "Trip reminder"
                );
            }
            None => debug!(%event, "Ignoring unknown event"),
        }
    }

    async fn on_notification(&self, data: Value) {
        let notification = match serde_json::from_value::<WireNotification>(data) {
            Ok(wire) => ClientNotification::from(wire),
            Err(e) => {
                warn!(%e, "Malformed notification push");
                return;
            }
        };

        let toast = Toast::from(&notification);
        let id = notification.id.clone();
        if !self
            .state
            .write()
            .await
            .reduce(Action::ReceivePush(notification))
        {
            debug!(%id, "Duplicate notification push");
            return;
        }
        // No one listening for toasts is fine.
        let _ = self.toasts.send(toast);
    }

    /// A newer call replaces a refetch that has not fired yet.
    async fn schedule_refetch(self: &Arc<Self>, api: NotificationApi) {
        let mut pending = self.pending_refetch.lock().await;
        if let Some(handle) = pending.take() {
            handle.abort();
        }

        let shared = Arc::clone(self);
        let delay = self.refetch_delay;
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            shared.refresh(&api).await;
        }));
    }

    async fn cancel_refetch(&self) {
        if let Some(handle) = self.pending_refetch.lock().await.take() {
            handle.abort();
        }
    }
}

struct Active {
    api: NotificationApi,
    reader: Option<JoinHandle<()>>,
}

/// Keeps one user's notifications in sync.
///
/// One live subscription at a time: [`Subscriber::authenticate`] replaces any
/// previous one. Nothing reconnects on its own; a lost socket leaves the
/// subscriber `Disconnected` with whatever REST last returned.
pub struct Subscriber {
    config: SubscriberConfig,
    http: Client,
    shared: Arc<Shared>,
    active: Mutex<Option<Active>>,
}

impl Subscriber {
    /// Toasts for new notifications arrive on the returned receiver.
    pub fn new(config: SubscriberConfig) -> (Self, mpsc::UnboundedReceiver<Toast>) {
        let (toasts, toast_rx) = mpsc::unbounded_channel();
        let (connection, _) = watch::channel(ConnectionState::Disconnected);
        let shared = Arc::new(Shared {
            state: RwLock::new(NotificationState::new()),
            connection,
            toasts,
            refetch_delay: config.refetch_delay,
            pending_refetch: Mutex::new(None),
        });

        let subscriber = Self {
            config,
            http: Client::new(),
            shared,
            active: Mutex::new(None),
        };
        (subscriber, toast_rx)
    }

    /// Loads the user's notifications and subscribes to `user.{id}`.
    ///
    /// Whatever the previous identity held is dropped first. A failed socket
    /// is not an error: the list comes from one REST fetch and the returned
    /// state is `Disconnected`.
    pub async fn authenticate(&self, session: Session) -> ClientResult<ConnectionState> {
        self.teardown().await;
        self.shared.state.write().await.reduce(Action::Load(Vec::new()));

        let user_id = ObjectId::parse_str(&session.user_id)
            .map_err(|_| ClientError::InvalidUserId(session.user_id.clone()))?;
        let channel = ChannelName::User(user_id).to_string();

        self.shared.set_connection(ConnectionState::Connecting);
        let api = NotificationApi::new(self.http.clone(), &self.config.api_url, &session.token);

        // Frames arriving before the reader starts wait in the socket.
        let socket = self.open_channel(&session.token, &channel).await;
        if let Err(e) = &socket {
            warn!(%e, "Realtime connection failed, falling back to REST");
            self.shared.set_connection(ConnectionState::Disconnected);
        }
        self.shared.refresh(&api).await;

        let reader = socket.ok().map(|ws| {
            tokio::spawn(read_channel(self.shared.clone(), api.clone(), channel, ws))
        });

        *self.active.lock().await = Some(Active { api, reader });
        Ok(self.connection_state())
    }

    async fn open_channel(&self, token: &str, channel: &str) -> ClientResult<WsStream> {
        let url = format!("{}?token={}", self.config.ws_url, token);
        let (mut ws, _) = tokio_tungstenite::connect_async(url).await?;

        let subscribe = serde_json::to_string(&ClientMessage::Subscribe {
            channel: channel.to_string(),
        })?;
        ws.send(Message::text(subscribe)).await?;
        Ok(ws)
    }

    async fn teardown(&self) {
        if let Some(active) = self.active.lock().await.take() {
            if let Some(reader) = active.reader {
                reader.abort();
            }
        }
        self.shared.cancel_refetch().await;
        self.shared.set_connection(ConnectionState::Disconnected);
    }

    /// Drops the subscription and forgets every notification.
    pub async fn logout(&self) {
        self.teardown().await;
        self.shared.state.write().await.reduce(Action::Load(Vec::new()));
        info!("Logged out");
    }

    async fn api(&self) -> Option<NotificationApi> {
        self.active.lock().await.as_ref().map(|a| a.api.clone())
    }

    pub async fn fetch_notifications(&self) {
        if let Some(api) = self.api().await {
            self.shared.fetch_notifications(&api).await;
        }
    }

    /// The server's count. Local state is not touched; its count is derived
    /// from the list.
    pub async fn fetch_unread_count(&self) -> Option<u64> {
        let api = self.api().await?;
        self.shared.fetch_unread_count(&api).await
    }

    pub async fn mark_as_read(&self, id: &str) {
        self.shared
            .state
            .write()
            .await
            .reduce(Action::MarkRead {
                id: id.to_string(),
                read_at: now_rfc3339(),
            });
        if let Some(api) = self.api().await {
            if let Err(e) = api.mark_read(id).await {
                warn!(%id, %e, "Failed to mark notification read");
            }
        }
    }

    pub async fn mark_all_as_read(&self) {
        self.shared.state.write().await.reduce(Action::MarkAllRead {
            read_at: now_rfc3339(),
        });
        if let Some(api) = self.api().await {
            match api.mark_all_read().await {
                Ok(updated) => debug!(updated, "Marked all notifications read"),
                Err(e) => warn!(%e, "Failed to mark all notifications read"),
            }
        }
    }

    pub async fn delete_notification(&self, id: &str) {
        self.shared
            .state
            .write()
            .await
            .reduce(Action::Delete(id.to_string()));
        if let Some(api) = self.api().await {
            if let Err(e) = api.delete(id).await {
                warn!(%id, %e, "Failed to delete notification");
            }
        }
    }

    pub async fn notifications(&self) -> Vec<ClientNotification> {
        self.shared.state.read().await.notifications().to_vec()
    }

    pub async fn unread_count(&self) -> usize {
        self.shared.state.read().await.unread_count()
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.shared.connection.borrow()
    }

    pub fn watch_connection(&self) -> watch::Receiver<ConnectionState> {
        self.shared.connection.subscribe()
    }
}

impl Drop for Subscriber {
    fn drop(&mut self) {
        if let Some(active) = self.active.get_mut().take() {
            if let Some(reader) = active.reader {
                reader.abort();
            }
        }
    }
}

/// Local stand-in for the server's `read_at` until the next load.
fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

async fn read_channel(
    shared: Arc<Shared>,
    api: NotificationApi,
    channel: String,
    mut ws: WsStream,
) {
    while let Some(msg) = ws.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ServerMessage>(text.as_str()) {
                Ok(message) => {
                    if !shared.on_server_message(&api, &channel, message).await {
                        break;
                    }
                }
                Err(e) => debug!(%e, "Ignoring unrecognized server message"),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(%channel, %e, "WebSocket read failed");
                break;
            }
        }
    }

    shared.set_connection(ConnectionState::Disconnected);
    info!(%channel, "Notification channel closed");
    shared.refresh(&api).await;
}
