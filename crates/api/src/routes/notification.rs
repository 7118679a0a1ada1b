use axum::{
    Json,
    extract::{Path, State},
};
use bson::oid::ObjectId;
use cocar_services::notification::NotificationView;

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

fn parse_id(notification_id: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(notification_id)
        .map_err(|_| ApiError::BadRequest("Invalid notification_id".to_string()))
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let notifications = state.notifications.list(auth.user_id).await?;
    let items: Vec<NotificationView> = notifications.iter().map(NotificationView::from).collect();

    Ok(Json(serde_json::json!({ "data": items })))
}

pub async fn unread_count(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let count = state.notifications.unread_count(auth.user_id).await?;

    Ok(Json(serde_json::json!({ "data": { "unread_count": count } })))
}

pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(notification_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let nid = parse_id(&notification_id)?;

    let notification = state.notifications.mark_read(auth.user_id, nid).await?;

    Ok(Json(serde_json::json!({
        "data": NotificationView::from(&notification),
    })))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let updated = state.notifications.mark_all_read(auth.user_id).await?;

    Ok(Json(serde_json::json!({ "data": { "updated": updated } })))
}

pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(notification_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let nid = parse_id(&notification_id)?;

    if !state.notifications.delete(auth.user_id, nid).await? {
        return Err(ApiError::NotFound("Notification not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "deleted": true })))
}
