use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    membership::MembershipController,
    models::CallerIdentity,
    query::PresenceQueryService,
    types::{PresenceRequest, RpcId, RpcReply},
};
use crate::channel::{ChannelBackend, ChannelKey};
use crate::event::EventBus;
use crate::shared::AppError;

/// Entry point for presence RPCs: validates the payload once, then routes
/// the typed request to the membership controller or the query service
pub struct PresenceService {
    membership: MembershipController,
    queries: PresenceQueryService,
}

impl PresenceService {
    pub fn new(backend: Arc<dyn ChannelBackend>, event_bus: EventBus) -> Self {
        Self {
            membership: MembershipController::new(backend.clone(), event_bus),
            queries: PresenceQueryService::new(backend),
        }
    }

    /// Parses `payload` for `rpc` and executes it on behalf of `identity`.
    ///
    /// A rejected payload is a successful reply carrying an error body; no
    /// backend call is made for it.
    #[instrument(skip(self, identity, payload), fields(user_id = %identity.user_id))]
    pub async fn call(
        &self,
        identity: &CallerIdentity,
        rpc: RpcId,
        payload: &str,
    ) -> Result<RpcReply, AppError> {
        match PresenceRequest::parse(rpc, payload) {
            Ok(request @ PresenceRequest::CountRoom { .. }) => {
                match self.execute(identity, request).await {
                    Ok(reply) => Ok(reply),
                    Err(error) => {
                        warn!(rpc = %rpc, error = %error, "Room count failed");
                        Ok(RpcReply::RoomCountFailed(error))
                    }
                }
            }
            Ok(request) => self.execute(identity, request).await,
            Err(error) => {
                warn!(rpc = %rpc, error = %error, "Rejected RPC payload");
                Ok(RpcReply::Rejected { rpc, error })
            }
        }
    }

    /// Executes an already validated request
    pub async fn execute(
        &self,
        identity: &CallerIdentity,
        request: PresenceRequest,
    ) -> Result<RpcReply, AppError> {
        let reply = match request {
            PresenceRequest::JoinGlobal => {
                self.membership.join_global(identity).await?;
                RpcReply::Success
            }
            PresenceRequest::ListGlobal => {
                let users = self.queries.list_online(&ChannelKey::global(), true).await?;
                info!(online_users = users.len(), "Listed global online users");
                RpcReply::OnlineUsers(users)
            }
            PresenceRequest::CountGlobal => {
                RpcReply::GlobalCount(self.queries.count(&ChannelKey::global()).await?)
            }
            PresenceRequest::JoinRoomVisible { room } => {
                self.membership.join_room_visible(identity, &room).await?;
                RpcReply::Success
            }
            PresenceRequest::JoinRoomHidden { room } => {
                self.membership.join_room_hidden(identity, &room).await?;
                RpcReply::Success
            }
            PresenceRequest::ListRoom { room } => {
                let users = self.queries.list_online(&room, true).await?;
                info!(room = %room, online_users = users.len(), "Listed room online users");
                RpcReply::OnlineUsers(users)
            }
            PresenceRequest::CountRoom { room } => {
                RpcReply::RoomCount(self.queries.count(&room).await?)
            }
            PresenceRequest::LeaveRoom { room } => {
                self.membership.leave_room(identity, &room).await?;
                RpcReply::Success
            }
        };
        Ok(reply)
    }
}
