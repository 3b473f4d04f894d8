use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};
use thiserror::Error;

use super::models::OnlineUser;
use crate::channel::ChannelKey;
use crate::shared::AppError;

/// RPC functions exposed under `/rpc/{rpc_id}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum RpcId {
    JoinOnlineUsersStream,
    GetOnlineUsers,
    CountOnlineUsers,
    JoinRoomStreamAsOnline,
    JoinRoomStreamAsOffline,
    GetOnlineUsersInRoom,
    CountRoomOnlineUsers,
    LeaveRoomChannel,
}

impl RpcId {
    /// Whether the payload must carry a `roomName`
    pub fn is_room_scoped(&self) -> bool {
        !matches!(
            self,
            RpcId::JoinOnlineUsersStream | RpcId::GetOnlineUsers | RpcId::CountOnlineUsers
        )
    }
}

/// Payload of every room-scoped RPC
#[derive(Debug, Deserialize)]
pub struct RoomPayload {
    #[serde(rename = "roomName")]
    pub room_name: String,
}

/// Why a payload was rejected before reaching any component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("Invalid JSON format")]
    InvalidJson,

    #[error("Invalid room format")]
    InvalidRoom,
}

/// A validated RPC call
#[derive(Debug, Clone, PartialEq)]
pub enum PresenceRequest {
    JoinGlobal,
    ListGlobal,
    CountGlobal,
    JoinRoomVisible { room: ChannelKey },
    JoinRoomHidden { room: ChannelKey },
    ListRoom { room: ChannelKey },
    CountRoom { room: ChannelKey },
    LeaveRoom { room: ChannelKey },
}

impl PresenceRequest {
    /// Validates the raw payload for `rpc`. Global RPCs ignore the payload.
    pub fn parse(rpc: RpcId, payload: &str) -> Result<Self, PayloadError> {
        let room = if rpc.is_room_scoped() {
            Some(Self::parse_room(payload)?)
        } else {
            None
        };

        let request = match (rpc, room) {
            (RpcId::JoinOnlineUsersStream, _) => PresenceRequest::JoinGlobal,
            (RpcId::GetOnlineUsers, _) => PresenceRequest::ListGlobal,
            (RpcId::CountOnlineUsers, _) => PresenceRequest::CountGlobal,
            (RpcId::JoinRoomStreamAsOnline, Some(room)) => PresenceRequest::JoinRoomVisible { room },
            (RpcId::JoinRoomStreamAsOffline, Some(room)) => PresenceRequest::JoinRoomHidden { room },
            (RpcId::GetOnlineUsersInRoom, Some(room)) => PresenceRequest::ListRoom { room },
            (RpcId::CountRoomOnlineUsers, Some(room)) => PresenceRequest::CountRoom { room },
            (RpcId::LeaveRoomChannel, Some(room)) => PresenceRequest::LeaveRoom { room },
            (_, None) => return Err(PayloadError::InvalidRoom),
        };
        Ok(request)
    }

    fn parse_room(payload: &str) -> Result<ChannelKey, PayloadError> {
        let value: serde_json::Value =
            serde_json::from_str(payload).map_err(|_| PayloadError::InvalidJson)?;
        // Derived Deserialize also accepts the sequence form `["r1"]`
        if !value.is_object() {
            return Err(PayloadError::InvalidRoom);
        }
        let room: RoomPayload =
            serde_json::from_value(value).map_err(|_| PayloadError::InvalidRoom)?;

        ChannelKey::room(room.room_name).map_err(|_| PayloadError::InvalidRoom)
    }
}

/// `{ "status": "success" }`
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn success() -> Self {
        Self {
            status: "success".to_string(),
        }
    }
}

/// `{ "status": "success", "count": n }`
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct RoomCountResponse {
    pub status: String,
    pub count: usize,
}

/// What an RPC returns to the caller
#[derive(Debug)]
pub enum RpcReply {
    Success,
    OnlineUsers(BTreeMap<String, OnlineUser>),
    /// Rendered as the bare number, e.g. `3`
    GlobalCount(usize),
    RoomCount(usize),
    /// Rejected payload; the body shape depends on the RPC
    Rejected { rpc: RpcId, error: PayloadError },
    /// Room count that failed after validation, in the count's error shape
    RoomCountFailed(AppError),
}

impl IntoResponse for RpcReply {
    fn into_response(self) -> Response {
        match self {
            RpcReply::Success => Json(StatusResponse::success()).into_response(),
            RpcReply::OnlineUsers(users) => Json(users).into_response(),
            RpcReply::GlobalCount(count) => count.to_string().into_response(),
            RpcReply::RoomCount(count) => Json(RoomCountResponse {
                status: "success".to_string(),
                count,
            })
            .into_response(),
            RpcReply::Rejected {
                rpc: RpcId::CountRoomOnlineUsers,
                error,
            } => Json(json!({ "status": "error", "message": error.to_string() })).into_response(),
            RpcReply::Rejected { error, .. } => {
                Json(json!({ "error": error.to_string() })).into_response()
            }
            RpcReply::RoomCountFailed(error) => (
                error.status_code(),
                Json(json!({ "status": "error", "message": error.to_string() })),
            )
                .into_response(),
        }
    }
}
