use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::presence::models::CallerIdentity;

/// Facts about channel membership that other components react to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PresenceEvent {
    /// A member has left a room's channel. Published only after the backend
    /// has removed the member.
    ChannelLeft {
        room_name: String,
        identity: CallerIdentity,
    },
}

impl PresenceEvent {
    pub fn room_name(&self) -> &str {
        match self {
            PresenceEvent::ChannelLeft { room_name, .. } => room_name,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            PresenceEvent::ChannelLeft { .. } => "channel_left",
        }
    }
}

/// Events delivered to the members of a single room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RoomEvent {
    Notification(RoomNotification),
    /// The room was deleted; no further events follow
    Closed,
}

/// A message sent into a room's messaging channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomNotification {
    pub id: Uuid,
    pub room_name: String,
    pub sender_id: String,
    pub content: String,
    /// Whether offline members get it later; departure notices never do
    pub persist: bool,
    pub created_at: DateTime<Utc>,
}

impl RoomNotification {
    /// "`<user id>` left the channel." for the remaining members only
    pub fn departure(room_name: &str, identity: &CallerIdentity) -> Self {
        Self {
            id: Uuid::new_v4(),
            room_name: room_name.to_string(),
            sender_id: identity.user_id.clone(),
            content: format!("{} left the channel.", identity.user_id),
            persist: false,
            created_at: Utc::now(),
        }
    }
}
