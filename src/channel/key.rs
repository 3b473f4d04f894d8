use serde::{Deserialize, Serialize};
use std::fmt;

use crate::shared::AppError;

/// Logical grouping a caller can be present in
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    /// The single "who is online" scope
    Global,
    /// A named room
    Room(String),
}

/// Identifier of a channel in the backend
///
/// Global channels carry no label and room channels are labelled with the
/// room name, so no room name can ever collide with the global channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId {
    label: Option<String>,
}

impl ChannelId {
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            None => write!(f, "online"),
            Some(label) => write!(f, "room:{}", label),
        }
    }
}

/// A validated scope. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelKey {
    scope: Scope,
}

impl ChannelKey {
    /// Validates a scope and wraps it as a channel key
    pub fn resolve(scope: Scope) -> Result<Self, AppError> {
        if let Scope::Room(name) = &scope {
            if name.is_empty() {
                return Err(AppError::InvalidScope("Room name must not be empty".to_string()));
            }
        }
        Ok(Self { scope })
    }

    pub fn global() -> Self {
        Self {
            scope: Scope::Global,
        }
    }

    pub fn room(name: impl Into<String>) -> Result<Self, AppError> {
        Self::resolve(Scope::Room(name.into()))
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Room name for room scopes, `None` for the global scope
    pub fn room_name(&self) -> Option<&str> {
        match &self.scope {
            Scope::Global => None,
            Scope::Room(name) => Some(name),
        }
    }

    /// Backend identifier for this scope. Deterministic for equal scopes.
    pub fn channel_id(&self) -> ChannelId {
        ChannelId {
            label: self.room_name().map(str::to_string),
        }
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.channel_id())
    }
}
