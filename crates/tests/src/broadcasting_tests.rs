use crate::fixtures::test_app::TestApp;
use cocar_db::models::BookingStatus;
use serde_json::{Value, json};

async fn authorize(app: &TestApp, token: &str, channel: &str) -> reqwest::Response {
    app.auth_post("/api/broadcasting/auth", token)
        .json(&json!({ "channel_name": channel }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn user_channel_is_private_to_its_owner() {
    let app = TestApp::spawn().await;
    let ana = app.seed_user("Ana");
    let ivo = app.seed_user("Ivo");
    let channel = format!("user.{}", ana.id.to_hex());

    let resp = authorize(&app, &ana.access_token, &channel).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["channel"], channel.as_str());
    assert!(body["channel_data"].is_null());

    let resp = authorize(&app, &ivo.access_token, &channel).await;
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn private_prefix_is_accepted() {
    let app = TestApp::spawn().await;
    let ana = app.seed_user("Ana");

    let resp = authorize(
        &app,
        &ana.access_token,
        &format!("private-user.{}", ana.id.to_hex()),
    )
    .await;
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn trip_channel_roles() {
    let app = TestApp::spawn().await;
    let ride = app.seed_ride(BookingStatus::Confirmed);
    let channel = format!("trip.{}", ride.trip_id.to_hex());

    let resp = authorize(&app, &ride.driver.access_token, &channel).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["channel_data"]["role"], "driver");

    let resp = authorize(&app, &ride.passenger.access_token, &channel).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["channel_data"]["role"], "passenger");
}

#[tokio::test]
async fn trip_channel_denies_non_participants() {
    let app = TestApp::spawn().await;
    let ride = app.seed_ride(BookingStatus::Pending);
    let stranger = app.seed_user("Stranger");
    let rejected = app.seed_user("Rejected");
    app.seed_booking(ride.trip_id, rejected.id, BookingStatus::Rejected);
    let channel = format!("trip.{}", ride.trip_id.to_hex());

    for token in [&stranger.access_token, &rejected.access_token] {
        let resp = authorize(&app, token, &channel).await;
        assert_eq!(resp.status(), 403);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "forbidden");
    }
}

#[tokio::test]
async fn conversation_channel_returns_presence() {
    let app = TestApp::spawn().await;
    let ride = app.seed_ride(BookingStatus::Confirmed);
    let outsider = app.seed_user("Outsider");
    let conversation =
        app.seed_conversation(&[ride.driver.id, ride.passenger.id], Some(ride.trip_id));
    let channel = format!("conversation.{}", conversation.to_hex());

    let resp = authorize(&app, &ride.passenger.access_token, &channel).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["channel_data"]["id"], ride.passenger.id.to_hex());
    assert_eq!(body["channel_data"]["name"], "Pero");

    let resp = authorize(&app, &outsider.access_token, &channel).await;
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn malformed_channels_are_denied() {
    let app = TestApp::spawn().await;
    let ana = app.seed_user("Ana");

    for channel in ["", "presence-lobby", "user.123", "trip"] {
        let resp = authorize(&app, &ana.access_token, channel).await;
        assert_eq!(resp.status(), 403, "{channel}");
    }
}

#[tokio::test]
async fn auth_requires_a_token() {
    let app = TestApp::spawn().await;
    let ana = app.seed_user("Ana");

    let resp = app
        .client
        .post(app.url("/api/broadcasting/auth"))
        .json(&json!({ "channel_name": format!("user.{}", ana.id.to_hex()) }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}
