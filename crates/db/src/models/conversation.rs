use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub participant_ids: Vec<ObjectId>,
    /// Set when the conversation is about a specific trip.
    pub trip_id: Option<ObjectId>,
    pub created_at: DateTime,
}

impl Conversation {
    pub const COLLECTION: &'static str = "conversations";

    pub fn has_participant(&self, user_id: &ObjectId) -> bool {
        self.participant_ids.contains(user_id)
    }
}
