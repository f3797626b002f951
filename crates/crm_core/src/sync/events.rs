//! Change events and their channel wire shapes.

use crate::model::ids::UserId;
use crate::model::validation::ValidationError;
use crate::model::Timestamp;
use crate::store::collection::Collection;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Something other contexts may want to re-render for.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    /// A whole collection was rewritten.
    DataChanged {
        collection: Collection,
        timestamp: Timestamp,
    },
    /// A tab set its session to `user_id`.
    AuthChanged { user_id: Option<UserId> },
    /// A tab cleared its session.
    AuthCleared,
    /// Every collection was removed.
    StoreCleared,
}

impl ChangeEvent {
    /// Stable event name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DataChanged { .. } => "data-changed",
            Self::AuthChanged { .. } => "auth-changed",
            Self::AuthCleared => "auth-cleared",
            Self::StoreCleared => "store-cleared",
        }
    }

    pub fn collection(&self) -> Option<Collection> {
        match self {
            Self::DataChanged { collection, .. } => Some(*collection),
            _ => None,
        }
    }
}

/// JSON message carried by the channel, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChannelMessage {
    #[serde(rename = "sync")]
    Sync { key: String, ts: String },
    #[serde(rename = "auth")]
    Auth {
        #[serde(rename = "userId")]
        user_id: Option<String>,
    },
    #[serde(rename = "auth-logout")]
    AuthLogout,
    #[serde(rename = "cleared")]
    Cleared,
}

impl From<&ChangeEvent> for ChannelMessage {
    fn from(event: &ChangeEvent) -> Self {
        match event {
            ChangeEvent::DataChanged {
                collection,
                timestamp,
            } => Self::Sync {
                key: collection.key().to_string(),
                ts: timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            },
            ChangeEvent::AuthChanged { user_id } => Self::Auth {
                user_id: user_id.as_ref().map(|id| id.as_str().to_string()),
            },
            ChangeEvent::AuthCleared => Self::AuthLogout,
            ChangeEvent::StoreCleared => Self::Cleared,
        }
    }
}

impl TryFrom<ChannelMessage> for ChangeEvent {
    type Error = ValidationError;

    fn try_from(message: ChannelMessage) -> Result<Self, Self::Error> {
        match message {
            ChannelMessage::Sync { key, ts } => {
                let collection = key.parse::<Collection>()?;
                let timestamp = DateTime::parse_from_rfc3339(&ts)
                    .map_err(|_| ValidationError::UnknownLabel {
                        field: "ts",
                        value: ts.clone(),
                    })?
                    .with_timezone(&Utc);
                Ok(Self::DataChanged {
                    collection,
                    timestamp,
                })
            }
            ChannelMessage::Auth { user_id } => Ok(Self::AuthChanged {
                user_id: user_id.as_deref().map(UserId::parse).transpose()?,
            }),
            ChannelMessage::AuthLogout => Ok(Self::AuthCleared),
            ChannelMessage::Cleared => Ok(Self::StoreCleared),
        }
    }
}
