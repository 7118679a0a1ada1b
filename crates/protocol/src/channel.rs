use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Prefix some clients put in front of private channel names.
const PRIVATE_PREFIX: &str = "private-";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChannelError {
    #[error("Unknown channel kind: {0}")]
    UnknownKind(String),
    #[error("Malformed channel name: {0}")]
    Malformed(String),
    #[error("Invalid channel id: {0}")]
    InvalidId(String),
}

/// A private broadcast topic. Every variant requires authorization before a
/// connection may receive its events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ChannelName {
    User(ObjectId),
    Conversation(ObjectId),
    Trip(ObjectId),
}

impl ChannelName {
    pub fn kind(&self) -> &'static str {
        match self {
            ChannelName::User(_) => "user",
            ChannelName::Conversation(_) => "conversation",
            ChannelName::Trip(_) => "trip",
        }
    }

    pub fn id(&self) -> ObjectId {
        match self {
            ChannelName::User(id) | ChannelName::Conversation(id) | ChannelName::Trip(id) => *id,
        }
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.kind(), self.id().to_hex())
    }
}

impl FromStr for ChannelName {
    type Err = ChannelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.strip_prefix(PRIVATE_PREFIX).unwrap_or(s);
        let (kind, id) = name
            .split_once('.')
            .ok_or_else(|| ChannelError::Malformed(s.to_string()))?;
        let id = ObjectId::parse_str(id).map_err(|_| ChannelError::InvalidId(id.to_string()))?;

        match kind {
            "user" => Ok(ChannelName::User(id)),
            "conversation" => Ok(ChannelName::Conversation(id)),
            "trip" => Ok(ChannelName::Trip(id)),
            other => Err(ChannelError::UnknownKind(other.to_string())),
        }
    }
}

impl TryFrom<String> for ChannelName {
    type Error = ChannelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChannelName> for String {
    fn from(channel: ChannelName) -> Self {
        channel.to_string()
    }
}
