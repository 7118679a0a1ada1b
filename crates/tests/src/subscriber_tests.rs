use crate::fixtures::{seed::SeededUser, test_app::TestApp};
use axum::{Json, Router, routing::get};
use bson::oid::ObjectId;
use cocar_client::{ConnectionState, Session, Subscriber, SubscriberConfig, Toast, ToastKind};
use cocar_db::models::BookingStatus;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc::UnboundedReceiver;

const WAIT: Duration = Duration::from_secs(5);

fn subscriber_for(app: &TestApp) -> (Subscriber, UnboundedReceiver<Toast>) {
    let mut config = SubscriberConfig::new(app.base_url.clone(), app.ws_url.clone());
    config.refetch_delay = Duration::from_millis(100);
    Subscriber::new(config)
}

fn session(user: &SeededUser) -> Session {
    Session {
        user_id: user.id.to_hex(),
        token: user.access_token.clone(),
    }
}

async fn wait_connected(subscriber: &Subscriber) {
    let mut rx = subscriber.watch_connection();
    tokio::time::timeout(WAIT, rx.wait_for(|s| *s == ConnectionState::Connected))
        .await
        .expect("Timed out waiting for subscription")
        .unwrap();
}

/// Polls until the local list holds `len` notifications.
async fn wait_for_len(subscriber: &Subscriber, len: usize) {
    tokio::time::timeout(WAIT, async {
        while subscriber.notifications().await.len() != len {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("Timed out waiting for notifications");
}

async fn server_list(app: &TestApp, user: &SeededUser) -> Vec<Value> {
    let body: Value = app
        .auth_get("/api/notification", &user.access_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    body["data"].as_array().unwrap().clone()
}

#[tokio::test]
async fn authenticate_loads_and_subscribes() {
    let app = TestApp::spawn().await;
    let ana = app.seed_user("Ana");
    app.seed_notification(&ana, "Waiting for you").await;
    let (subscriber, _toasts) = subscriber_for(&app);

    subscriber.authenticate(session(&ana)).await.unwrap();
    wait_connected(&subscriber).await;

    let notifications = subscriber.notifications().await;
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].title, "Waiting for you");
    assert_eq!(subscriber.unread_count().await, 1);
    assert_eq!(subscriber.fetch_unread_count().await, Some(1));
}

#[tokio::test]
async fn pushed_notification_is_prepended_with_toast() {
    let app = TestApp::spawn().await;
    let ana = app.seed_user("Ana");
    app.seed_notification(&ana, "Older").await;
    let (subscriber, mut toasts) = subscriber_for(&app);
    subscriber.authenticate(session(&ana)).await.unwrap();
    wait_connected(&subscriber).await;

    let id = app.seed_notification(&ana, "Fresh").await;
    wait_for_len(&subscriber, 2).await;

    let notifications = subscriber.notifications().await;
    assert_eq!(notifications[0].id, id);
    assert_eq!(subscriber.unread_count().await, 2);

    let toast = tokio::time::timeout(WAIT, toasts.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(toast.title, "Fresh");
    assert_eq!(toast.kind, ToastKind::Info);
}

#[tokio::test]
async fn booking_change_triggers_refetch() {
    let app = TestApp::spawn().await;
    let ride = app.seed_ride(BookingStatus::Pending);
    let (subscriber, _toasts) = subscriber_for(&app);
    subscriber.authenticate(session(&ride.passenger)).await.unwrap();
    wait_connected(&subscriber).await;

    app.auth_put(
        &format!("/api/booking/{}/status", ride.booking_id.to_hex()),
        &ride.driver.access_token,
    )
    .json(&json!({ "status": "confirmed" }))
    .send()
    .await
    .unwrap();

    wait_for_len(&subscriber, 1).await;
    assert_eq!(
        subscriber.notifications().await[0].notification_type,
        "booking_confirmed"
    );

    // Let the delayed refetch run; it must agree with the pushed state.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(subscriber.notifications().await.len(), 1);
    assert_eq!(subscriber.unread_count().await, 1);
}

#[tokio::test]
async fn mark_as_read_and_mark_all_reach_the_server() {
    let app = TestApp::spawn().await;
    let ana = app.seed_user("Ana");
    let first = app.seed_notification(&ana, "One").await;
    app.seed_notification(&ana, "Two").await;
    app.seed_notification(&ana, "Three").await;
    let (subscriber, _toasts) = subscriber_for(&app);
    subscriber.authenticate(session(&ana)).await.unwrap();

    subscriber.mark_as_read(&first).await;
    assert_eq!(subscriber.unread_count().await, 2);
    assert_eq!(subscriber.fetch_unread_count().await, Some(2));

    subscriber.mark_all_as_read().await;
    assert_eq!(subscriber.unread_count().await, 0);
    assert_eq!(subscriber.fetch_unread_count().await, Some(0));
    assert!(server_list(&app, &ana).await.iter().all(|n| n["is_read"] == true));
}

#[tokio::test]
async fn delete_only_counts_unread_once() {
    let app = TestApp::spawn().await;
    let ana = app.seed_user("Ana");
    let read = app.seed_notification(&ana, "Read").await;
    let unread = app.seed_notification(&ana, "Unread").await;
    let (subscriber, _toasts) = subscriber_for(&app);
    subscriber.authenticate(session(&ana)).await.unwrap();
    subscriber.mark_as_read(&read).await;
    assert_eq!(subscriber.unread_count().await, 1);

    subscriber.delete_notification(&read).await;
    assert_eq!(subscriber.unread_count().await, 1);

    subscriber.delete_notification(&unread).await;
    assert_eq!(subscriber.unread_count().await, 0);
    assert!(subscriber.notifications().await.is_empty());
    assert!(server_list(&app, &ana).await.is_empty());
}

#[tokio::test]
async fn reauthenticating_switches_users() {
    let app = TestApp::spawn().await;
    let ana = app.seed_user("Ana");
    let ivo = app.seed_user("Ivo");
    app.seed_notification(&ana, "For Ana").await;
    app.seed_notification(&ivo, "For Ivo").await;
    let (subscriber, _toasts) = subscriber_for(&app);

    subscriber.authenticate(session(&ana)).await.unwrap();
    wait_connected(&subscriber).await;
    subscriber.authenticate(session(&ivo)).await.unwrap();
    wait_connected(&subscriber).await;

    let notifications = subscriber.notifications().await;
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].title, "For Ivo");

    // Pushes for the previous user no longer arrive.
    app.seed_notification(&ana, "Late for Ana").await;
    app.seed_notification(&ivo, "Late for Ivo").await;
    wait_for_len(&subscriber, 2).await;
    assert!(
        subscriber
            .notifications()
            .await
            .iter()
            .all(|n| n.title.contains("Ivo"))
    );
}

#[tokio::test]
async fn rejected_token_falls_back_to_disconnected() {
    let app = TestApp::spawn().await;
    let ana = app.seed_user("Ana");
    app.seed_notification(&ana, "Unreachable").await;
    let (subscriber, _toasts) = subscriber_for(&app);

    let state = subscriber
        .authenticate(Session {
            user_id: ana.id.to_hex(),
            token: "expired".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(state, ConnectionState::Disconnected);
    assert!(subscriber.notifications().await.is_empty());
}

#[tokio::test]
async fn failed_reauthentication_drops_previous_users_list() {
    let app = TestApp::spawn().await;
    let ana = app.seed_user("Ana");
    let ivo = app.seed_user("Ivo");
    app.seed_notification(&ana, "Private to Ana").await;
    let (subscriber, _toasts) = subscriber_for(&app);
    subscriber.authenticate(session(&ana)).await.unwrap();
    wait_connected(&subscriber).await;
    assert_eq!(subscriber.unread_count().await, 1);

    let state = subscriber
        .authenticate(Session {
            user_id: ivo.id.to_hex(),
            token: "expired".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(state, ConnectionState::Disconnected);
    assert!(subscriber.notifications().await.is_empty());
    assert_eq!(subscriber.unread_count().await, 0);
}

/// A REST-only server that counts list requests. It has no `/ws` route.
async fn counting_rest_server() -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let router = Router::new()
        .route(
            "/api/notification",
            get(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Json(json!({ "data": [] })) }
            }),
        )
        .route(
            "/api/notification/unread-count",
            get(|| async { Json(json!({ "data": { "count": 0 } })) }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{addr}"), hits)
}

#[tokio::test]
async fn socket_failure_fetches_over_rest_once() {
    let (base_url, hits) = counting_rest_server().await;
    let ws_url = format!("{}/ws", base_url.replace("http://", "ws://"));
    let (subscriber, _toasts) = Subscriber::new(SubscriberConfig::new(base_url, ws_url));

    let state = subscriber
        .authenticate(Session {
            user_id: ObjectId::new().to_hex(),
            token: "token".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(state, ConnectionState::Disconnected);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn logout_disconnects_and_clears() {
    let app = TestApp::spawn().await;
    let ana = app.seed_user("Ana");
    app.seed_notification(&ana, "Bye").await;
    let (subscriber, _toasts) = subscriber_for(&app);
    subscriber.authenticate(session(&ana)).await.unwrap();
    wait_connected(&subscriber).await;

    subscriber.logout().await;

    assert_eq!(subscriber.connection_state(), ConnectionState::Disconnected);
    assert!(subscriber.notifications().await.is_empty());
    assert_eq!(subscriber.unread_count().await, 0);
}
