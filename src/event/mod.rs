// Event-driven plumbing between the membership layer and its reactors
//
// Presence events (a member left a room channel) fan out to every
// subscriber; room events (notifications) fan out per room.

// Public API - what other modules can use
pub use bus::EventBus;
pub use events::{PresenceEvent, RoomEvent, RoomNotification};
pub use handler::{PresenceEventError, PresenceEventHandler};
pub use subscription::PresenceSubscription;

// Internal modules
mod bus;
mod events;
mod handler;
mod subscription;
