// Public API - what other modules can use
pub use lifecycle::{EventBusNotifier, LifecycleOutcome, RoomLifecycleHook, RoomNotifier};

// Internal modules
mod lifecycle;
pub mod models;
pub mod repository;
