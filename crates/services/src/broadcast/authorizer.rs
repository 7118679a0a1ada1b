use bson::oid::ObjectId;
use cocar_protocol::ChannelName;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::debug;

use crate::dao::DaoResult;
use crate::repository::RideRepository;

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelAuthorization {
    Granted { channel_data: Option<Value> },
    Denied,
}

impl ChannelAuthorization {
    pub fn is_granted(&self) -> bool {
        matches!(self, ChannelAuthorization::Granted { .. })
    }
}

/// Decides whether a user may subscribe to a private channel.
pub struct ChannelAuthorizer {
    rides: Arc<dyn RideRepository>,
}

impl ChannelAuthorizer {
    pub fn new(rides: Arc<dyn RideRepository>) -> Self {
        Self { rides }
    }

    /// Unparseable names are denied like any other unauthorized request.
    pub async fn authorize_name(
        &self,
        user_id: ObjectId,
        channel: &str,
    ) -> DaoResult<ChannelAuthorization> {
        match channel.parse::<ChannelName>() {
            Ok(channel) => self.authorize(user_id, &channel).await,
            Err(e) => {
                debug!(?user_id, channel, %e, "Rejecting malformed channel");
                Ok(ChannelAuthorization::Denied)
            }
        }
    }

    pub async fn authorize(
        &self,
        user_id: ObjectId,
        channel: &ChannelName,
    ) -> DaoResult<ChannelAuthorization> {
        let decision = match *channel {
            ChannelName::User(owner) => {
                if owner == user_id {
                    ChannelAuthorization::Granted { channel_data: None }
                } else {
                    ChannelAuthorization::Denied
                }
            }
            ChannelName::Conversation(conversation_id) => {
                self.authorize_conversation(user_id, conversation_id).await?
            }
            ChannelName::Trip(trip_id) => self.authorize_trip(user_id, trip_id).await?,
        };

        debug!(?user_id, %channel, granted = decision.is_granted(), "Channel authorization");
        Ok(decision)
    }

    async fn authorize_conversation(
        &self,
        user_id: ObjectId,
        conversation_id: ObjectId,
    ) -> DaoResult<ChannelAuthorization> {
        let Some(conversation) = self.rides.find_conversation(conversation_id).await? else {
            return Ok(ChannelAuthorization::Denied);
        };
        if !conversation.has_participant(&user_id) {
            return Ok(ChannelAuthorization::Denied);
        }

        let name = self
            .rides
            .find_user(user_id)
            .await?
            .map(|u| u.name)
            .unwrap_or_default();

        Ok(ChannelAuthorization::Granted {
            channel_data: Some(json!({
                "id": user_id.to_hex(),
                "name": name,
            })),
        })
    }

    async fn authorize_trip(
        &self,
        user_id: ObjectId,
        trip_id: ObjectId,
    ) -> DaoResult<ChannelAuthorization> {
        let Some(trip) = self.rides.find_trip(trip_id).await? else {
            return Ok(ChannelAuthorization::Denied);
        };

        let role = if trip.driver_id == Some(user_id) {
            "driver"
        } else if self
            .rides
            .find_active_booking(trip_id, user_id)
            .await?
            .is_some()
        {
            "passenger"
        } else {
            return Ok(ChannelAuthorization::Denied);
        };

        Ok(ChannelAuthorization::Granted {
            channel_data: Some(json!({ "role": role })),
        })
    }
}
