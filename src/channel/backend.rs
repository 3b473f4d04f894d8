use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::key::ChannelId;
use crate::presence::models::CallerIdentity;
use crate::shared::AppError;

/// Flags passed to a backend join
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinOptions {
    pub hidden: bool,
    pub persistence: bool,
}

impl JoinOptions {
    pub fn visible() -> Self {
        Self {
            hidden: false,
            persistence: true,
        }
    }

    pub fn hidden() -> Self {
        Self {
            hidden: true,
            persistence: true,
        }
    }
}

/// One member of one channel, as held by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipRecord {
    pub identity: CallerIdentity,
    pub visible: bool,
    pub persistent: bool,
    pub joined_at: DateTime<Utc>,
}

impl MembershipRecord {
    fn new(identity: CallerIdentity, options: JoinOptions) -> Self {
        Self {
            identity,
            visible: !options.hidden,
            persistent: options.persistence,
            joined_at: Utc::now(),
        }
    }
}

/// Result of asking the backend to flip a member's visibility in place
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityUpdate {
    /// The existing record was updated atomically
    Updated,
    /// The identity holds no record in the channel
    NotMember,
    /// The backend has no atomic update primitive
    Unsupported,
}

/// Membership primitives of a broadcast channel backend.
///
/// Every method is one atomic request. A join for an identity that already
/// holds a record in the channel replaces that record, never duplicates it.
#[async_trait]
pub trait ChannelBackend: Send + Sync {
    async fn join(
        &self,
        channel: &ChannelId,
        identity: &CallerIdentity,
        options: JoinOptions,
    ) -> Result<(), AppError>;

    /// Removes the identity's record. Returns false when it was not a member.
    async fn leave(&self, channel: &ChannelId, identity: &CallerIdentity) -> Result<bool, AppError>;

    /// Members in join order, hidden ones only when `include_hidden` is set
    async fn list(
        &self,
        channel: &ChannelId,
        include_hidden: bool,
    ) -> Result<Vec<MembershipRecord>, AppError>;

    /// Raw record count, hidden members included
    async fn count(&self, channel: &ChannelId) -> Result<usize, AppError>;

    async fn update_visibility(
        &self,
        _channel: &ChannelId,
        _identity: &CallerIdentity,
        _hidden: bool,
    ) -> Result<VisibilityUpdate, AppError> {
        Ok(VisibilityUpdate::Unsupported)
    }
}

/// In-memory channel backend for development and testing
///
/// Each channel holds its records in join order; a replacing join moves the
/// identity to the end.
pub struct InMemoryChannelBackend {
    channels: Arc<RwLock<HashMap<ChannelId, Vec<MembershipRecord>>>>,
    atomic_visibility: bool,
}

impl Default for InMemoryChannelBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryChannelBackend {
    /// Creates an empty backend that supports atomic visibility updates
    pub fn new() -> Self {
        Self::with_atomic_visibility(true)
    }

    /// Creates an empty backend, optionally without the atomic visibility
    /// primitive (callers then fall back to leave-then-join)
    pub fn with_atomic_visibility(atomic_visibility: bool) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            atomic_visibility,
        }
    }

    /// Number of channels that currently have at least one member
    pub async fn channel_count(&self) -> usize {
        self.channels.read().await.len()
    }
}

#[async_trait]
impl ChannelBackend for InMemoryChannelBackend {
    #[instrument(skip(self, identity), fields(user_id = %identity.user_id))]
    async fn join(
        &self,
        channel: &ChannelId,
        identity: &CallerIdentity,
        options: JoinOptions,
    ) -> Result<(), AppError> {
        let mut channels = self.channels.write().await;
        let members = channels.entry(channel.clone()).or_default();

        let before = members.len();
        members.retain(|record| !record.identity.same_session(identity));
        members.push(MembershipRecord::new(identity.clone(), options));

        debug!(
            channel = %channel,
            hidden = options.hidden,
            replaced = before == members.len(),
            member_count = members.len(),
            "Joined channel"
        );
        Ok(())
    }

    #[instrument(skip(self, identity), fields(user_id = %identity.user_id))]
    async fn leave(&self, channel: &ChannelId, identity: &CallerIdentity) -> Result<bool, AppError> {
        let mut channels = self.channels.write().await;

        let Some(members) = channels.get_mut(channel) else {
            debug!(channel = %channel, "Leave on unknown channel");
            return Ok(false);
        };

        let before = members.len();
        members.retain(|record| !record.identity.same_session(identity));
        let removed = members.len() < before;

        if members.is_empty() {
            channels.remove(channel);
        }

        debug!(channel = %channel, removed = removed, "Left channel");
        Ok(removed)
    }

    async fn list(
        &self,
        channel: &ChannelId,
        include_hidden: bool,
    ) -> Result<Vec<MembershipRecord>, AppError> {
        let channels = self.channels.read().await;

        Ok(channels
            .get(channel)
            .map(|members| {
                members
                    .iter()
                    .filter(|record| include_hidden || record.visible)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn count(&self, channel: &ChannelId) -> Result<usize, AppError> {
        let channels = self.channels.read().await;
        Ok(channels.get(channel).map_or(0, Vec::len))
    }

    #[instrument(skip(self, identity), fields(user_id = %identity.user_id))]
    async fn update_visibility(
        &self,
        channel: &ChannelId,
        identity: &CallerIdentity,
        hidden: bool,
    ) -> Result<VisibilityUpdate, AppError> {
        if !self.atomic_visibility {
            return Ok(VisibilityUpdate::Unsupported);
        }

        let mut channels = self.channels.write().await;
        let record = channels.get_mut(channel).and_then(|members| {
            members
                .iter_mut()
                .find(|record| record.identity.same_session(identity))
        });

        match record {
            Some(record) => {
                record.visible = !hidden;
                record.identity = identity.clone();
                debug!(channel = %channel, hidden = hidden, "Visibility updated in place");
                Ok(VisibilityUpdate::Updated)
            }
            None => Ok(VisibilityUpdate::NotMember),
        }
    }
}
