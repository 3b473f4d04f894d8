use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::{bus::EventBus, handler::PresenceEventHandler};

/// Routes presence events from the bus to a handler on a background task
pub struct PresenceSubscription {
    handler: Arc<dyn PresenceEventHandler>,
    event_bus: EventBus,
}

impl PresenceSubscription {
    pub fn new(handler: Arc<dyn PresenceEventHandler>, event_bus: EventBus) -> Self {
        Self { handler, event_bus }
    }

    /// Start the subscription. Events are handled one at a time, in the
    /// order they were published.
    ///
    /// The receiver is created before this returns, so events published
    /// afterwards are never missed.
    pub fn start(self) -> JoinHandle<()> {
        let handler_name = self.handler.handler_name();
        info!(handler = handler_name, "Starting presence subscription");

        let mut receiver = self.event_bus.subscribe();

        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        info!(
                            handler = handler_name,
                            event_type = event.event_type(),
                            room_name = %event.room_name(),
                            "Received presence event"
                        );

                        if let Err(e) = self.handler.handle_presence_event(event).await {
                            warn!(
                                handler = handler_name,
                                error = %e,
                                "Presence event handler failed"
                            );
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(
                            handler = handler_name,
                            skipped = skipped,
                            "Presence subscription lagged, events dropped"
                        );
                    }
                    Err(RecvError::Closed) => break,
                }
            }

            warn!(
                handler = handler_name,
                "Presence subscription ended - no more events"
            );
        })
    }
}
