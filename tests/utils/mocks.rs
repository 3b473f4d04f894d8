use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use roompresence::{
    channel::{ChannelBackend, ChannelId, InMemoryChannelBackend, JoinOptions, MembershipRecord, VisibilityUpdate},
    AppError, CallerIdentity,
};

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// A backend call, as seen by the mock
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Join { channel: String, user_id: String, hidden: bool },
    Leave { channel: String, user_id: String },
    List { channel: String },
    Count { channel: String },
    UpdateVisibility { channel: String, user_id: String },
}

impl BackendCall {
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            BackendCall::Join { .. } | BackendCall::Leave { .. } | BackendCall::UpdateVisibility { .. }
        )
    }
}

/// One-shot pause point inside a backend call
#[derive(Default)]
pub struct PausePoint {
    armed: AtomicBool,
    entered: Notify,
    release: Notify,
}

impl PausePoint {
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    pub async fn wait_until_paused(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }

    async fn pass(&self) {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
    }
}

/// In-memory backend that records every call and can be paused at the
/// start of the next join or at the end of the next count
pub struct ControlledChannelBackend {
    inner: InMemoryChannelBackend,
    calls: Mutex<Vec<BackendCall>>,
    pub join_pause: Arc<PausePoint>,
    pub count_pause: Arc<PausePoint>,
}

impl ControlledChannelBackend {
    pub fn new(atomic_visibility: bool) -> Self {
        Self {
            inner: InMemoryChannelBackend::with_atomic_visibility(atomic_visibility),
            calls: Mutex::new(Vec::new()),
            join_pause: Arc::new(PausePoint::default()),
            count_pause: Arc::new(PausePoint::default()),
        }
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutations(&self) -> Vec<BackendCall> {
        self.calls().into_iter().filter(BackendCall::is_mutation).collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: BackendCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ChannelBackend for ControlledChannelBackend {
    async fn join(
        &self,
        channel: &ChannelId,
        identity: &CallerIdentity,
        options: JoinOptions,
    ) -> Result<(), AppError> {
        self.record(BackendCall::Join {
            channel: channel.to_string(),
            user_id: identity.user_id.clone(),
            hidden: options.hidden,
        });
        self.join_pause.pass().await;
        self.inner.join(channel, identity, options).await
    }

    async fn leave(&self, channel: &ChannelId, identity: &CallerIdentity) -> Result<bool, AppError> {
        self.record(BackendCall::Leave {
            channel: channel.to_string(),
            user_id: identity.user_id.clone(),
        });
        self.inner.leave(channel, identity).await
    }

    async fn list(
        &self,
        channel: &ChannelId,
        include_hidden: bool,
    ) -> Result<Vec<MembershipRecord>, AppError> {
        self.record(BackendCall::List {
            channel: channel.to_string(),
        });
        self.inner.list(channel, include_hidden).await
    }

    async fn count(&self, channel: &ChannelId) -> Result<usize, AppError> {
        self.record(BackendCall::Count {
            channel: channel.to_string(),
        });
        let count = self.inner.count(channel).await;
        self.count_pause.pass().await;
        count
    }

    async fn update_visibility(
        &self,
        channel: &ChannelId,
        identity: &CallerIdentity,
        hidden: bool,
    ) -> Result<VisibilityUpdate, AppError> {
        self.record(BackendCall::UpdateVisibility {
            channel: channel.to_string(),
            user_id: identity.user_id.clone(),
        });
        self.inner.update_visibility(channel, identity, hidden).await
    }
}
