use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use super::events::{PresenceEvent, RoomEvent};

/// Event bus for distributing events throughout the application
#[derive(Debug, Clone)]
pub struct EventBus {
    /// Presence events, delivered to every subscriber
    presence: broadcast::Sender<PresenceEvent>,
    /// Room-specific event channels: room_name -> sender
    room_channels: Arc<RwLock<HashMap<String, broadcast::Sender<RoomEvent>>>>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new event bus; `capacity` bounds every underlying channel
    pub fn new(capacity: usize) -> Self {
        let (presence, _) = broadcast::channel(capacity);
        Self {
            presence,
            room_channels: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    /// Publishes a presence event to all current subscribers
    pub fn publish(&self, event: PresenceEvent) {
        match self.presence.send(event) {
            Ok(receiver_count) => {
                debug!(receivers = receiver_count, "Presence event published");
            }
            Err(_) => {
                debug!("Presence event published with no receivers");
            }
        }
    }

    /// Subscribe to presence events
    pub fn subscribe(&self) -> broadcast::Receiver<PresenceEvent> {
        self.presence.subscribe()
    }

    /// Emits an event to all subscribers of a specific room
    pub async fn emit_to_room(&self, room_name: &str, event: RoomEvent) {
        let room_channels = self.room_channels.read().await;

        match room_channels.get(room_name) {
            Some(sender) => match sender.send(event) {
                Ok(receiver_count) => {
                    debug!(
                        room_name = %room_name,
                        receivers = receiver_count,
                        "Room event emitted"
                    );
                }
                Err(_) => {
                    debug!(room_name = %room_name, "Room event emitted with no receivers");
                }
            },
            // Nobody has subscribed, so nobody is listening
            None => debug!(room_name = %room_name, "No room channel - event dropped"),
        }
    }

    /// Subscribe to events for a specific room
    pub async fn subscribe_to_room(&self, room_name: &str) -> broadcast::Receiver<RoomEvent> {
        let room_channels = self.room_channels.read().await;

        if let Some(sender) = room_channels.get(room_name) {
            sender.subscribe()
        } else {
            debug!(room_name = %room_name, "Creating new room channel for subscription");
            drop(room_channels);

            let mut room_channels = self.room_channels.write().await;
            // Another subscriber may have created it between the two locks
            room_channels
                .entry(room_name.to_string())
                .or_insert_with(|| broadcast::channel(self.capacity).0)
                .subscribe()
        }
    }

    /// Emits `RoomEvent::Closed` and drops the room's channel
    pub async fn close_room(&self, room_name: &str) {
        let mut room_channels = self.room_channels.write().await;

        if let Some(sender) = room_channels.remove(room_name) {
            let _ = sender.send(RoomEvent::Closed);
            debug!(room_name = %room_name, "Room channel closed");
        }
    }

    /// Number of rooms with an open event channel
    pub async fn room_channel_count(&self) -> usize {
        self.room_channels.read().await.len()
    }
}
