// Library crate for the room presence server
// This file exposes the public API for integration tests

pub mod app;
pub mod channel;
pub mod config;
pub mod event;
pub mod presence;
pub mod room;
pub mod shared;

// Re-export commonly used types for easier access in tests
pub use app::{build_router, start_room_lifecycle};
pub use channel::{ChannelBackend, ChannelKey, InMemoryChannelBackend, Scope};
pub use event::{EventBus, PresenceEvent, PresenceSubscription, RoomEvent};
pub use presence::models::CallerIdentity;
pub use room::{
    repository::{InMemoryRoomRecordRepository, RoomRecordRepository},
    RoomLifecycleHook,
};
pub use shared::{AppError, AppState};
