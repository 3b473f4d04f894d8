use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::channel::ChannelBackend;
use crate::event::EventBus;
use crate::room::repository::RoomRecordRepository;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub channel_backend: Arc<dyn ChannelBackend>,
    pub room_repository: Arc<dyn RoomRecordRepository + Send + Sync>,
    pub event_bus: EventBus,
}

impl AppState {
    pub fn new(
        channel_backend: Arc<dyn ChannelBackend>,
        room_repository: Arc<dyn RoomRecordRepository + Send + Sync>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            channel_backend,
            room_repository,
            event_bus,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid scope: {0}")]
    InvalidScope(String),

    #[error("Channel backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidScope(_) => StatusCode::BAD_REQUEST,
            AppError::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match self {
            AppError::BackendUnavailable(_) | AppError::DatabaseError(_) => self.to_string(),
            AppError::InvalidScope(msg) | AppError::Unauthorized(msg) | AppError::NotFound(msg) => {
                msg
            }
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
