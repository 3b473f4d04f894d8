use async_trait::async_trait;
use thiserror::Error;

use super::events::PresenceEvent;

/// Errors that can occur when handling presence events
#[derive(Debug, Error)]
pub enum PresenceEventError {
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Channel backend error: {0}")]
    Backend(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Notification error: {0}")]
    Notification(String),
}

/// Trait for components that react to presence events
#[async_trait]
pub trait PresenceEventHandler: Send + Sync {
    /// Handle a presence event
    ///
    /// Handlers should be idempotent where possible - handling the same
    /// event multiple times should be safe.
    async fn handle_presence_event(&self, event: PresenceEvent) -> Result<(), PresenceEventError>;

    /// Get a human-readable name for this handler (for logging/debugging)
    fn handler_name(&self) -> &'static str;
}
