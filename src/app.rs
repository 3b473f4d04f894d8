use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::event::PresenceSubscription;
use crate::presence::{self, PresenceQueryService};
use crate::room::{EventBusNotifier, RoomLifecycleHook};
use crate::shared::AppState;

/// Builds the HTTP router. RPC routes require a caller identity; the
/// health check does not.
pub fn build_router(app_state: AppState) -> Router {
    let rpc_routes = Router::new()
        .route("/rpc/:rpc_id", post(presence::rpc))
        .layer(middleware::from_fn(presence::caller_identity));

    Router::new()
        .route("/health", get(presence::health))
        .merge(rpc_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

/// Spawns the room lifecycle hook on the state's event bus, using the same
/// backend and room repository the RPC handlers see
pub fn start_room_lifecycle(app_state: &AppState) -> JoinHandle<()> {
    let hook = RoomLifecycleHook::new(
        PresenceQueryService::new(Arc::clone(&app_state.channel_backend)),
        Arc::clone(&app_state.room_repository),
        Arc::new(EventBusNotifier::new(app_state.event_bus.clone())),
    );

    PresenceSubscription::new(Arc::new(hook), app_state.event_bus.clone()).start()
}
