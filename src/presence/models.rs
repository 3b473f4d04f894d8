use serde::{Deserialize, Serialize};

/// Who is making a call, as supplied by the host for the duration of one request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub user_id: String,
    pub session_id: String,
    pub username: String,
}

impl CallerIdentity {
    pub fn new(
        user_id: impl Into<String>,
        session_id: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
            username: username.into(),
        }
    }

    /// Membership records are keyed by user and session, not by username
    pub fn same_session(&self, other: &CallerIdentity) -> bool {
        self.user_id == other.user_id && self.session_id == other.session_id
    }
}

/// Entry of an "online users" listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineUser {
    pub id: String,
    pub username: String,
}
