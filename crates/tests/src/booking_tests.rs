use crate::fixtures::test_app::TestApp;
use bson::oid::ObjectId;
use cocar_db::models::BookingStatus;
use serde_json::{Value, json};

async fn change_status(
    app: &TestApp,
    token: &str,
    booking_id: ObjectId,
    status: &str,
) -> reqwest::Response {
    app.auth_put(&format!("/api/booking/{}/status", booking_id.to_hex()), token)
        .json(&json!({ "status": status }))
        .send()
        .await
        .unwrap()
}

async fn notifications(app: &TestApp, token: &str) -> Vec<Value> {
    let body: Value = app
        .auth_get("/api/notification", token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    body["data"].as_array().unwrap().clone()
}

#[tokio::test]
async fn driver_confirms_and_passenger_is_notified() {
    let app = TestApp::spawn().await;
    let ride = app.seed_ride(BookingStatus::Pending);

    let resp = change_status(&app, &ride.driver.access_token, ride.booking_id, "confirmed").await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["id"], ride.booking_id.to_hex());
    assert_eq!(body["data"]["status"], "confirmed");

    let passenger = notifications(&app, &ride.passenger.access_token).await;
    assert_eq!(passenger.len(), 1);
    assert_eq!(passenger[0]["type"], "booking_confirmed");
    assert_eq!(passenger[0]["data"]["booking_id"], ride.booking_id.to_hex());
    assert!(notifications(&app, &ride.driver.access_token).await.is_empty());
}

#[tokio::test]
async fn passenger_cancels_and_driver_is_notified() {
    let app = TestApp::spawn().await;
    let ride = app.seed_ride(BookingStatus::Confirmed);

    let resp = change_status(
        &app,
        &ride.passenger.access_token,
        ride.booking_id,
        "cancelled",
    )
    .await;
    assert_eq!(resp.status(), 200);

    let driver = notifications(&app, &ride.driver.access_token).await;
    assert_eq!(driver.len(), 1);
    assert_eq!(driver[0]["type"], "booking_cancelled");
}

#[tokio::test]
async fn disallowed_transitions_are_rejected() {
    let app = TestApp::spawn().await;
    let ride = app.seed_ride(BookingStatus::Pending);

    // Passengers cannot confirm their own booking.
    let resp = change_status(
        &app,
        &ride.passenger.access_token,
        ride.booking_id,
        "confirmed",
    )
    .await;
    assert_eq!(resp.status(), 422);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "validation");

    // Pending bookings cannot be completed.
    let resp = change_status(&app, &ride.driver.access_token, ride.booking_id, "completed").await;
    assert_eq!(resp.status(), 422);

    assert!(notifications(&app, &ride.passenger.access_token).await.is_empty());
}

#[tokio::test]
async fn strangers_are_forbidden() {
    let app = TestApp::spawn().await;
    let ride = app.seed_ride(BookingStatus::Pending);
    let stranger = app.seed_user("Stranger");

    let resp = change_status(&app, &stranger.access_token, ride.booking_id, "cancelled").await;
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn unknown_booking_is_not_found() {
    let app = TestApp::spawn().await;
    let ride = app.seed_ride(BookingStatus::Pending);

    let resp = change_status(&app, &ride.driver.access_token, ObjectId::new(), "confirmed").await;
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn unknown_status_is_a_client_error() {
    let app = TestApp::spawn().await;
    let ride = app.seed_ride(BookingStatus::Pending);

    let resp = change_status(&app, &ride.driver.access_token, ride.booking_id, "teleported").await;
    assert!(resp.status().is_client_error());
}
