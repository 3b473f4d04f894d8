use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::{models::StorageKey, repository::RoomRecordRepository};
use crate::channel::ChannelKey;
use crate::event::{
    EventBus, PresenceEvent, PresenceEventError, PresenceEventHandler, RoomEvent, RoomNotification,
};
use crate::presence::{models::CallerIdentity, PresenceQueryService};
use crate::shared::AppError;

/// Messaging side of a room: delivers notifications to its current members
#[async_trait]
pub trait RoomNotifier: Send + Sync {
    async fn send_to_room(&self, notification: RoomNotification) -> Result<(), AppError>;

    /// The room's metadata is gone; release anything held for it
    async fn room_closed(&self, _room_name: &str) {}
}

/// Delivers room notifications through the event bus's per-room channels
pub struct EventBusNotifier {
    event_bus: EventBus,
}

impl EventBusNotifier {
    pub fn new(event_bus: EventBus) -> Self {
        Self { event_bus }
    }
}

#[async_trait]
impl RoomNotifier for EventBusNotifier {
    async fn send_to_room(&self, notification: RoomNotification) -> Result<(), AppError> {
        let room_name = notification.room_name.clone();
        self.event_bus
            .emit_to_room(&room_name, RoomEvent::Notification(notification))
            .await;
        Ok(())
    }

    async fn room_closed(&self, room_name: &str) {
        self.event_bus.close_room(room_name).await;
    }
}

/// What the hook did for one departure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleOutcome {
    /// The channel was empty and the room record was deleted
    /// (`existed` is false if it was already gone)
    RoomDeleted { existed: bool },
    /// Members remain; a departure notice was sent to them
    MemberDeparted { remaining: usize },
}

/// Last one out closes the room.
///
/// Count and delete are two separate steps, so a member joining in between
/// can lose the room's record. Records are recreatable, so that is accepted.
pub struct RoomLifecycleHook {
    queries: PresenceQueryService,
    repository: Arc<dyn RoomRecordRepository + Send + Sync>,
    notifier: Arc<dyn RoomNotifier>,
}

impl RoomLifecycleHook {
    pub fn new(
        queries: PresenceQueryService,
        repository: Arc<dyn RoomRecordRepository + Send + Sync>,
        notifier: Arc<dyn RoomNotifier>,
    ) -> Self {
        Self {
            queries,
            repository,
            notifier,
        }
    }

    /// Reacts to `identity` having left `room_name`. Must only be called
    /// after the backend has removed the member.
    #[instrument(skip(self, identity), fields(user_id = %identity.user_id))]
    pub async fn on_member_left(
        &self,
        room_name: &str,
        identity: &CallerIdentity,
    ) -> Result<LifecycleOutcome, AppError> {
        let room = ChannelKey::room(room_name)?;
        let remaining = self.queries.count(&room).await?;

        if remaining == 0 {
            info!(room_name = %room_name, "Room is empty, deleting room record");

            let key = StorageKey::room(&identity.user_id, room_name);
            let existed = self.repository.delete_record(&key).await?;
            self.notifier.room_closed(room_name).await;

            return Ok(LifecycleOutcome::RoomDeleted { existed });
        }

        debug!(room_name = %room_name, remaining = remaining, "Members remain, announcing departure");
        self.notifier
            .send_to_room(RoomNotification::departure(room_name, identity))
            .await?;

        Ok(LifecycleOutcome::MemberDeparted { remaining })
    }
}

#[async_trait]
impl PresenceEventHandler for RoomLifecycleHook {
    async fn handle_presence_event(&self, event: PresenceEvent) -> Result<(), PresenceEventError> {
        match event {
            PresenceEvent::ChannelLeft {
                room_name,
                identity,
            } => {
                let outcome = self
                    .on_member_left(&room_name, &identity)
                    .await
                    .map_err(|e| match e {
                        AppError::DatabaseError(msg) => PresenceEventError::Storage(msg),
                        AppError::BackendUnavailable(msg) => PresenceEventError::Backend(msg),
                        AppError::InvalidScope(msg) => PresenceEventError::InvalidEvent(msg),
                        other => PresenceEventError::Notification(other.to_string()),
                    })?;

                debug!(room_name = %room_name, outcome = ?outcome, "Room lifecycle handled");
                Ok(())
            }
        }
    }

    fn handler_name(&self) -> &'static str {
        "RoomLifecycleHook"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{ChannelBackend, InMemoryChannelBackend, JoinOptions};
    use crate::room::models::RoomRecord;
    use crate::room::repository::InMemoryRoomRecordRepository;
    use crate::shared::test_utils::{identity, FailingChannelBackend};

    struct Fixture {
        backend: Arc<InMemoryChannelBackend>,
        repository: Arc<InMemoryRoomRecordRepository>,
        event_bus: EventBus,
        hook: RoomLifecycleHook,
    }

    fn fixture() -> Fixture {
        let backend = Arc::new(InMemoryChannelBackend::new());
        let repository = Arc::new(InMemoryRoomRecordRepository::new());
        let event_bus = EventBus::new(16);
        let hook = RoomLifecycleHook::new(
            PresenceQueryService::new(backend.clone()),
            repository.clone(),
            Arc::new(EventBusNotifier::new(event_bus.clone())),
        );
        Fixture {
            backend,
            repository,
            event_bus,
            hook,
        }
    }

    #[tokio::test]
    async fn test_last_member_out_deletes_record() {
        let f = fixture();
        let alice = identity("alice");
        let key = StorageKey::room("alice", "r1");
        f.repository.write_record(&key, &RoomRecord::new("r1")).await.unwrap();

        let outcome = f.hook.on_member_left("r1", &alice).await.unwrap();

        assert_eq!(outcome, LifecycleOutcome::RoomDeleted { existed: true });
        assert!(f.repository.get_record(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_deleting_absent_record_is_not_an_error() {
        let f = fixture();

        let outcome = f.hook.on_member_left("r1", &identity("alice")).await.unwrap();

        assert_eq!(outcome, LifecycleOutcome::RoomDeleted { existed: false });
    }

    #[tokio::test]
    async fn test_remaining_members_get_departure_notice() {
        let f = fixture();
        let room = ChannelKey::room("r1").unwrap();
        let key = StorageKey::room("alice", "r1");
        f.repository.write_record(&key, &RoomRecord::new("r1")).await.unwrap();
        f.backend
            .join(&room.channel_id(), &identity("bob"), JoinOptions::visible())
            .await
            .unwrap();
        let mut room_events = f.event_bus.subscribe_to_room("r1").await;

        let outcome = f.hook.on_member_left("r1", &identity("alice")).await.unwrap();

        assert_eq!(outcome, LifecycleOutcome::MemberDeparted { remaining: 1 });
        assert!(f.repository.get_record(&key).await.unwrap().is_some());
        match room_events.recv().await.unwrap() {
            RoomEvent::Notification(notification) => {
                assert_eq!(notification.content, "alice left the channel.");
                assert!(!notification.persist);
            }
            other => panic!("unexpected room event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_hidden_members_keep_room_alive() {
        let f = fixture();
        let room = ChannelKey::room("r1").unwrap();
        f.backend
            .join(&room.channel_id(), &identity("bob"), JoinOptions::hidden())
            .await
            .unwrap();

        let outcome = f.hook.on_member_left("r1", &identity("alice")).await.unwrap();

        assert_eq!(outcome, LifecycleOutcome::MemberDeparted { remaining: 1 });
    }

    #[tokio::test]
    async fn test_deletion_closes_room_channel() {
        let f = fixture();
        let mut room_events = f.event_bus.subscribe_to_room("r1").await;

        f.hook.on_member_left("r1", &identity("alice")).await.unwrap();

        assert!(matches!(room_events.recv().await.unwrap(), RoomEvent::Closed));
        assert_eq!(f.event_bus.room_channel_count().await, 0);
    }

    #[tokio::test]
    async fn test_backend_failure_deletes_nothing() {
        let repository = Arc::new(InMemoryRoomRecordRepository::new());
        let key = StorageKey::room("alice", "r1");
        repository.write_record(&key, &RoomRecord::new("r1")).await.unwrap();
        let hook = RoomLifecycleHook::new(
            PresenceQueryService::new(Arc::new(FailingChannelBackend)),
            repository.clone(),
            Arc::new(EventBusNotifier::new(EventBus::new(16))),
        );

        let result = hook.on_member_left("r1", &identity("alice")).await;

        assert!(matches!(result.unwrap_err(), AppError::BackendUnavailable(_)));
        assert!(repository.get_record(&key).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_event_with_empty_room_name_is_rejected() {
        let f = fixture();

        let result = f
            .hook
            .handle_presence_event(PresenceEvent::ChannelLeft {
                room_name: String::new(),
                identity: identity("alice"),
            })
            .await;

        assert!(matches!(result.unwrap_err(), PresenceEventError::InvalidEvent(_)));
    }
}
