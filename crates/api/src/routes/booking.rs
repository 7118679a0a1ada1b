use axum::{
    Json,
    extract::{Path, State},
};
use bson::oid::ObjectId;
use cocar_db::models::{Booking, BookingStatus};
use serde::Deserialize;

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: BookingStatus,
}

fn booking_json(booking: &Booking) -> serde_json::Value {
    serde_json::json!({
        "id": booking.id.map(|id| id.to_hex()),
        "trip_id": booking.trip_id.to_hex(),
        "passenger_id": booking.passenger_id.to_hex(),
        "seats": booking.seats,
        "total_price": booking.total_price,
        "status": booking.status.as_str(),
        "created_at": booking.created_at.try_to_rfc3339_string().unwrap_or_default(),
        "updated_at": booking.updated_at.try_to_rfc3339_string().unwrap_or_default(),
    })
}

pub async fn update_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(booking_id): Path<String>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let bid = ObjectId::parse_str(&booking_id)
        .map_err(|_| ApiError::BadRequest("Invalid booking_id".to_string()))?;

    let booking = state
        .bookings
        .change_status(bid, auth.user_id, body.status)
        .await?;

    Ok(Json(serde_json::json!({ "data": booking_json(&booking) })))
}
