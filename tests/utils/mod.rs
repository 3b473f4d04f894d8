pub mod mocks;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use mocks::{BackendCall, ControlledChannelBackend};
#[allow(unused_imports)]
pub use setup::{next_room_event, room_payload, TestSetup, TestSetupBuilder};
