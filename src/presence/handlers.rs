use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    models::CallerIdentity,
    service::PresenceService,
    types::{RpcId, RpcReply},
};
use crate::shared::{AppError, AppState};

/// HTTP handler for presence RPCs
///
/// POST /rpc/{rpc_id}
/// The body is the raw RPC payload; the caller comes from the identity middleware.
#[instrument(name = "rpc", skip(state, identity, payload), fields(user_id = %identity.user_id))]
pub async fn rpc(
    State(state): State<AppState>,
    Extension(identity): Extension<CallerIdentity>,
    Path(rpc_id): Path<String>,
    payload: String,
) -> Result<RpcReply, AppError> {
    let rpc = RpcId::from_str(&rpc_id).map_err(|_| {
        warn!(rpc_id = %rpc_id, "Unknown RPC function");
        AppError::NotFound("RPC function not found".to_string())
    })?;

    info!(rpc = %rpc, "Handling RPC");

    let service = PresenceService::new(Arc::clone(&state.channel_backend), state.event_bus.clone());
    service.call(&identity, rpc, &payload).await
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
