use serde::{Deserialize, Serialize};

/// Storage collection holding room metadata records
pub const ROOMS_COLLECTION: &str = "rooms";

/// Address of a record in the key-value store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageKey {
    pub collection: String,
    pub key: String,
    /// Owning identity namespace
    pub user_id: String,
}

impl StorageKey {
    /// Key of the metadata record for `room_name` in `user_id`'s namespace
    pub fn room(user_id: impl Into<String>, room_name: impl Into<String>) -> Self {
        Self {
            collection: ROOMS_COLLECTION.to_string(),
            key: room_name.into(),
            user_id: user_id.into(),
        }
    }
}

/// Metadata kept for a room while it has members.
///
/// Absence means "nothing cached", not "room gone": a record removed while
/// someone was joining can simply be written again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRecord {
    #[serde(rename = "roomName")]
    pub room_name: String,
}

impl RoomRecord {
    pub fn new(room_name: impl Into<String>) -> Self {
        Self {
            room_name: room_name.into(),
        }
    }
}
