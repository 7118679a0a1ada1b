use crate::fixtures::test_app::TestApp;
use bson::oid::ObjectId;
use serde_json::Value;

async fn unread_count(app: &TestApp, token: &str) -> u64 {
    let resp = app
        .auth_get("/api/notification/unread-count", token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    body["data"]["unread_count"].as_u64().unwrap()
}

async fn list(app: &TestApp, token: &str) -> Vec<Value> {
    let resp = app
        .auth_get("/api/notification", token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    body["data"].as_array().unwrap().clone()
}

#[tokio::test]
async fn list_is_newest_first_and_scoped_to_owner() {
    let app = TestApp::spawn().await;
    let ana = app.seed_user("Ana");
    let ivo = app.seed_user("Ivo");

    let first = app.seed_notification(&ana, "First").await;
    let second = app.seed_notification(&ana, "Second").await;
    app.seed_notification(&ivo, "Not yours").await;

    let items = list(&app, &ana.access_token).await;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["id"], second.as_str());
    assert_eq!(items[1]["id"], first.as_str());
    assert_eq!(items[0]["type"], "system");
    assert_eq!(items[0]["is_read"], false);
    assert_eq!(items[0]["data"]["source"], "test");

    assert_eq!(unread_count(&app, &ana.access_token).await, 2);
    assert_eq!(unread_count(&app, &ivo.access_token).await, 1);
}

#[tokio::test]
async fn mark_read_updates_one_notification() {
    let app = TestApp::spawn().await;
    let ana = app.seed_user("Ana");
    let id = app.seed_notification(&ana, "Seat confirmed").await;
    app.seed_notification(&ana, "Other").await;

    let resp = app
        .auth_put(&format!("/api/notification/{}/read", id), &ana.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["id"], id.as_str());
    assert_eq!(body["data"]["is_read"], true);
    assert!(body["data"]["read_at"].is_string());

    assert_eq!(unread_count(&app, &ana.access_token).await, 1);
}

#[tokio::test]
async fn foreign_notifications_are_not_found() {
    let app = TestApp::spawn().await;
    let ana = app.seed_user("Ana");
    let ivo = app.seed_user("Ivo");
    let id = app.seed_notification(&ana, "Private").await;

    let resp = app
        .auth_put(&format!("/api/notification/{}/read", id), &ivo.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = app
        .auth_delete(&format!("/api/notification/{}", id), &ivo.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    assert_eq!(unread_count(&app, &ana.access_token).await, 1);
}

#[tokio::test]
async fn mark_all_read_leaves_nothing_unread() {
    let app = TestApp::spawn().await;
    let ana = app.seed_user("Ana");
    let read = app.seed_notification(&ana, "Already read").await;
    app.seed_notification(&ana, "Unread").await;
    app.auth_put(&format!("/api/notification/{}/read", read), &ana.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(unread_count(&app, &ana.access_token).await, 1);

    let resp = app
        .auth_put("/api/notification/read-all", &ana.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["updated"], 1);

    assert_eq!(unread_count(&app, &ana.access_token).await, 0);
    assert!(
        list(&app, &ana.access_token)
            .await
            .iter()
            .all(|n| n["is_read"] == true)
    );
}

#[tokio::test]
async fn delete_removes_notification() {
    let app = TestApp::spawn().await;
    let ana = app.seed_user("Ana");
    let id = app.seed_notification(&ana, "Doomed").await;
    app.seed_notification(&ana, "Survivor").await;

    let resp = app
        .auth_delete(&format!("/api/notification/{}", id), &ana.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["deleted"], true);

    let items = list(&app, &ana.access_token).await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "Survivor");
    assert_eq!(unread_count(&app, &ana.access_token).await, 1);

    let resp = app
        .auth_delete(&format!("/api/notification/{}", id), &ana.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn malformed_id_is_bad_request() {
    let app = TestApp::spawn().await;
    let ana = app.seed_user("Ana");

    let resp = app
        .auth_put("/api/notification/not-an-id/read", &ana.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn requests_need_a_valid_token() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .get(app.url("/api/notification"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = app
        .auth_get("/api/notification", "garbage")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn cookie_token_is_accepted() {
    let app = TestApp::spawn().await;
    let ana = app.seed_user("Ana");
    app.seed_notification(&ana, "Via cookie").await;

    let resp = app
        .client
        .get(app.url("/api/notification/unread-count"))
        .header("Cookie", format!("theme=dark; access_token={}", ana.access_token))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["unread_count"], 1);
}

#[tokio::test]
async fn unknown_user_sees_empty_list() {
    let app = TestApp::spawn().await;
    let token = app
        .state
        .auth
        .generate_access_token(ObjectId::new(), "ghost@cocar.test", "Ghost")
        .unwrap();

    assert!(list(&app, &token).await.is_empty());
    assert_eq!(unread_count(&app, &token).await, 0);
}
