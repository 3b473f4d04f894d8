use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};
use tower::ServiceExt; // for `oneshot`

use roompresence::{
    build_router,
    event::{EventBus, RoomEvent},
    start_room_lifecycle, AppState, InMemoryRoomRecordRepository,
};

use super::mocks::ControlledChannelBackend;

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub backend: Arc<ControlledChannelBackend>,
    pub repository: Arc<InMemoryRoomRecordRepository>,
    pub event_bus: EventBus,
    pub app: Router,
    pub _lifecycle_handle: JoinHandle<()>,
}

pub struct TestSetupBuilder {
    atomic_visibility: bool,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            atomic_visibility: true,
        }
    }

    /// Backend without in-place visibility updates (leave-then-join path)
    pub fn without_atomic_visibility(mut self) -> Self {
        self.atomic_visibility = false;
        self
    }

    pub fn build(self) -> TestSetup {
        let backend = Arc::new(ControlledChannelBackend::new(self.atomic_visibility));
        let repository = Arc::new(InMemoryRoomRecordRepository::new());
        let event_bus = EventBus::new(100);

        let app_state = AppState::new(backend.clone(), repository.clone(), event_bus.clone());
        let lifecycle_handle = start_room_lifecycle(&app_state);
        let app = build_router(app_state);

        TestSetup {
            backend,
            repository,
            event_bus,
            app,
            _lifecycle_handle: lifecycle_handle,
        }
    }
}

impl TestSetup {
    /// Calls an RPC as `user_id` (session `<user_id>-session`) and returns
    /// the status and raw body
    pub async fn rpc(&self, user_id: &str, rpc_id: &str, payload: &str) -> (StatusCode, String) {
        self.rpc_as(user_id, &format!("{}-session", user_id), rpc_id, payload)
            .await
    }

    pub async fn rpc_as(
        &self,
        user_id: &str,
        session_id: &str,
        rpc_id: &str,
        payload: &str,
    ) -> (StatusCode, String) {
        let request = Request::builder()
            .method("POST")
            .uri(format!("/rpc/{}", rpc_id))
            .header("x-user-id", user_id)
            .header("x-session-id", session_id)
            .header("x-username", format!("{}-name", user_id))
            .body(Body::from(payload.to_string()))
            .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    /// Calls an RPC and parses the body as JSON, asserting a 200
    pub async fn rpc_json(&self, user_id: &str, rpc_id: &str, payload: &str) -> Value {
        let (status, body) = self.rpc(user_id, rpc_id, payload).await;
        assert_eq!(status, StatusCode::OK, "unexpected status, body: {}", body);
        serde_json::from_str(&body).unwrap()
    }

    pub async fn subscribe_to_room(&self, room_name: &str) -> broadcast::Receiver<RoomEvent> {
        self.event_bus.subscribe_to_room(room_name).await
    }
}

/// Waits for the next room event, failing the test after a second
pub async fn next_room_event(receiver: &mut broadcast::Receiver<RoomEvent>) -> RoomEvent {
    timeout(Duration::from_secs(1), receiver.recv())
        .await
        .expect("timed out waiting for room event")
        .expect("room channel closed")
}

pub fn room_payload(room_name: &str) -> String {
    serde_json::json!({ "roomName": room_name }).to_string()
}
