use axum::{Json, extract::State};
use cocar_services::ChannelAuthorization;
use serde::Deserialize;
use tracing::debug;

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize)]
pub struct ChannelAuthRequest {
    pub channel_name: String,
}

/// Authorizes a private channel subscription made over a third-party
/// transport. The WebSocket endpoint runs the same check inline.
pub async fn auth(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<ChannelAuthRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match state
        .authorizer
        .authorize_name(auth.user_id, &body.channel_name)
        .await?
    {
        ChannelAuthorization::Granted { channel_data } => Ok(Json(serde_json::json!({
            "channel": body.channel_name,
            "channel_data": channel_data,
        }))),
        ChannelAuthorization::Denied => {
            debug!(user_id = ?auth.user_id, channel = %body.channel_name, "Channel auth denied");
            Err(ApiError::Forbidden("Channel access denied".to_string()))
        }
    }
}
