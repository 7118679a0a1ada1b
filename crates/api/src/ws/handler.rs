use axum::{
    extract::{Query, State, WebSocketUpgrade, ws::{Message, WebSocket}},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bson::oid::ObjectId;
use cocar_protocol::{ChannelName, ClientMessage, ServerMessage};
use cocar_services::ChannelAuthorization;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::dispatcher::send_to_connection;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub token: String,
}

pub async fn ws_upgrade(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    ws: WebSocketUpgrade,
) -> Response {
    // Verify JWT before accepting the WebSocket
    let claims = match state.auth.verify_access_token(&params.token) {
        Ok(c) => c,
        Err(_) => return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response(),
    };

    let user_id = match ObjectId::parse_str(&claims.sub) {
        Ok(id) => id,
        Err(_) => return (StatusCode::BAD_REQUEST, "Invalid user ID").into_response(),
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, user_id))
}

async fn handle_socket(socket: WebSocket, state: AppState, user_id: ObjectId) {
    let connection_id = Uuid::new_v4().to_string();
    info!(?user_id, %connection_id, "WebSocket connected");

    let (mut sink, mut receiver) = socket.split();
    let buffer = state.settings.broadcast.connection_buffer.max(1);
    let (sender, mut outbound) = mpsc::channel::<Message>(buffer);

    // Sole writer to the socket. A client that stops reading only fills its own buffer.
    let writer = tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    state
        .ws_storage
        .add(connection_id.clone(), user_id, sender.clone());

    send_to_connection(
        &state.ws_storage,
        &connection_id,
        &ServerMessage::Connected {
            connection_id: connection_id.clone(),
            user_id: user_id.to_hex(),
        },
    );

    // Message loop
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                handle_client_message(&state, &user_id, &connection_id, text.as_str()).await;
            }
            Ok(Message::Ping(data)) => {
                let _ = sender.try_send(Message::Pong(data));
            }
            Ok(Message::Close(_)) => {
                break;
            }
            Err(e) => {
                warn!(?user_id, %connection_id, %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    state.ws_storage.remove(&connection_id);
    writer.abort();
    info!(?user_id, %connection_id, "WebSocket disconnected");
}

async fn handle_client_message(
    state: &AppState,
    user_id: &ObjectId,
    connection_id: &str,
    text: &str,
) {
    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            debug!(?user_id, %connection_id, %e, "Ignoring unrecognized WS message");
            return;
        }
    };

    match message {
        ClientMessage::Subscribe { channel } => {
            handle_subscribe(state, user_id, connection_id, channel).await;
        }
        ClientMessage::Unsubscribe { channel } => {
            if let Ok(parsed) = channel.parse::<ChannelName>() {
                if state.ws_storage.unsubscribe(connection_id, &parsed) {
                    debug!(?user_id, %connection_id, %parsed, "Unsubscribed");
                }
            }
        }
        ClientMessage::Ping => {
            send_to_connection(&state.ws_storage, connection_id, &ServerMessage::Pong);
        }
    }
}

async fn handle_subscribe(
    state: &AppState,
    user_id: &ObjectId,
    connection_id: &str,
    channel: String,
) {
    let decision = match state.authorizer.authorize_name(*user_id, &channel).await {
        Ok(decision) => decision,
        Err(e) => {
            warn!(?user_id, %channel, %e, "Channel authorization failed");
            ChannelAuthorization::Denied
        }
    };

    let reply = match (decision, channel.parse::<ChannelName>()) {
        (ChannelAuthorization::Granted { channel_data }, Ok(parsed)) => {
            state.ws_storage.subscribe(connection_id, parsed);
            info!(?user_id, %connection_id, channel = %parsed, "Subscribed");
            ServerMessage::SubscriptionSucceeded {
                channel: parsed.to_string(),
                channel_data,
            }
        }
        _ => {
            debug!(?user_id, %connection_id, %channel, "Subscription denied");
            ServerMessage::SubscriptionError { channel }
        }
    };

    send_to_connection(&state.ws_storage, connection_id, &reply);
}
