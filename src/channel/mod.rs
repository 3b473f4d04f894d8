// Broadcast channel addressing and the backend boundary.
//
// The backend owns the membership table; everything above it only ever
// talks to the `ChannelBackend` trait.

// Public API - what other modules can use
pub use backend::{
    ChannelBackend, InMemoryChannelBackend, JoinOptions, MembershipRecord, VisibilityUpdate,
};
pub use key::{ChannelId, ChannelKey, Scope};

// Internal modules
mod backend;
mod key;
