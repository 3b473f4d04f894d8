use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::models::CallerIdentity;
use crate::channel::{ChannelBackend, ChannelKey, JoinOptions, VisibilityUpdate};
use crate::event::{EventBus, PresenceEvent};
use crate::shared::AppError;

/// Join, leave and visibility-switch operations for one caller at a time.
///
/// Every backend call is attempted at most once; failures go straight back
/// to the caller.
pub struct MembershipController {
    backend: Arc<dyn ChannelBackend>,
    event_bus: EventBus,
}

impl MembershipController {
    pub fn new(backend: Arc<dyn ChannelBackend>, event_bus: EventBus) -> Self {
        Self { backend, event_bus }
    }

    /// Joins the global online channel as a visible, persistent member
    #[instrument(skip(self, identity), fields(user_id = %identity.user_id))]
    pub async fn join_global(&self, identity: &CallerIdentity) -> Result<(), AppError> {
        let channel = ChannelKey::global().channel_id();
        self.backend
            .join(&channel, identity, JoinOptions::visible())
            .await?;

        info!(channel = %channel, "Joined global presence");
        Ok(())
    }

    /// Makes the caller a visible member of the room.
    ///
    /// Uses the backend's in-place update when it has one. Otherwise the
    /// caller leaves and re-joins, and is briefly absent from listings in
    /// between.
    #[instrument(skip(self, identity, room), fields(user_id = %identity.user_id, room = %room))]
    pub async fn join_room_visible(
        &self,
        identity: &CallerIdentity,
        room: &ChannelKey,
    ) -> Result<(), AppError> {
        let channel = room.channel_id();

        match self
            .backend
            .update_visibility(&channel, identity, false)
            .await?
        {
            VisibilityUpdate::Updated => {
                info!("Switched room membership to visible in place");
                return Ok(());
            }
            VisibilityUpdate::NotMember => {
                debug!("No existing membership, joining as visible");
            }
            VisibilityUpdate::Unsupported => {
                let was_member = self.backend.leave(&channel, identity).await?;
                debug!(was_member = was_member, "Left room before visible re-join");
            }
        }

        self.backend
            .join(&channel, identity, JoinOptions::visible())
            .await?;

        info!("Joined room as visible");
        Ok(())
    }

    /// Joins (or re-joins) the room as a hidden, persistent member
    #[instrument(skip(self, identity, room), fields(user_id = %identity.user_id, room = %room))]
    pub async fn join_room_hidden(
        &self,
        identity: &CallerIdentity,
        room: &ChannelKey,
    ) -> Result<(), AppError> {
        self.backend
            .join(&room.channel_id(), identity, JoinOptions::hidden())
            .await?;

        info!("Joined room as hidden");
        Ok(())
    }

    /// Leaves the room's channel and, once the backend has removed the
    /// record, announces the departure on the event bus.
    ///
    /// Returns whether the caller was a member. A caller who was not a
    /// member changes nothing and publishes nothing.
    #[instrument(skip(self, identity, room), fields(user_id = %identity.user_id, room = %room))]
    pub async fn leave_room(
        &self,
        identity: &CallerIdentity,
        room: &ChannelKey,
    ) -> Result<bool, AppError> {
        let room_name = room
            .room_name()
            .ok_or_else(|| AppError::InvalidScope("Only room channels can be left".to_string()))?
            .to_string();

        let was_member = self.backend.leave(&room.channel_id(), identity).await?;
        if !was_member {
            debug!("Leave by non-member ignored");
            return Ok(false);
        }

        self.event_bus.publish(PresenceEvent::ChannelLeft {
            room_name,
            identity: identity.clone(),
        });

        info!("Left room channel");
        Ok(true)
    }
}
