use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::models::OnlineUser;
use crate::channel::{ChannelBackend, ChannelKey};
use crate::shared::AppError;

/// Read-only views over channel membership
pub struct PresenceQueryService {
    backend: Arc<dyn ChannelBackend>,
}

impl PresenceQueryService {
    pub fn new(backend: Arc<dyn ChannelBackend>) -> Self {
        Self { backend }
    }

    /// Distinct members of the channel keyed by user id.
    ///
    /// A user connected through several sessions appears once, with the
    /// attributes of the most recently joined record.
    #[instrument(skip(self, scope), fields(scope = %scope))]
    pub async fn list_online(
        &self,
        scope: &ChannelKey,
        visible_only: bool,
    ) -> Result<BTreeMap<String, OnlineUser>, AppError> {
        let records = self
            .backend
            .list(&scope.channel_id(), !visible_only)
            .await?;
        let record_count = records.len();

        let users: BTreeMap<String, OnlineUser> = records
            .into_iter()
            .map(|record| {
                let user = OnlineUser {
                    id: record.identity.user_id.clone(),
                    username: record.identity.username,
                };
                (record.identity.user_id, user)
            })
            .collect();

        debug!(
            records = record_count,
            distinct_users = users.len(),
            "Listed online users"
        );
        Ok(users)
    }

    /// Raw member count including hidden members and duplicate sessions.
    /// Meant for emptiness checks; an "online" figure is `list_online(..).len()`.
    #[instrument(skip(self, scope), fields(scope = %scope))]
    pub async fn count(&self, scope: &ChannelKey) -> Result<usize, AppError> {
        let count = self.backend.count(&scope.channel_id()).await?;
        debug!(count = count, "Counted channel members");
        Ok(count)
    }
}
