use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};
use tracing::{debug, instrument, warn};

use super::models::CallerIdentity;
use crate::shared::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const SESSION_ID_HEADER: &str = "x-session-id";
pub const USERNAME_HEADER: &str = "x-username";

/// Reads the caller identity the host attached to the request and adds it
/// as a `CallerIdentity` extension.
/// Usage: .layer(middleware::from_fn(presence::caller_identity))
/// Handlers can then extract Extension(identity): Extension<CallerIdentity>.
#[instrument(skip(req, next))]
pub async fn caller_identity(mut req: Request, next: Next) -> Result<Response, AppError> {
    let identity = identity_from_headers(req.headers())?;

    debug!(
        user_id = %identity.user_id,
        session_id = %identity.session_id,
        "Caller identity attached to request"
    );

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

fn identity_from_headers(headers: &HeaderMap) -> Result<CallerIdentity, AppError> {
    let user_id = required_header(headers, USER_ID_HEADER)?;
    let session_id = required_header(headers, SESSION_ID_HEADER)?;
    let username = header_value(headers, USERNAME_HEADER).unwrap_or_else(|| user_id.clone());

    Ok(CallerIdentity::new(user_id, session_id, username))
}

fn required_header(headers: &HeaderMap, name: &str) -> Result<String, AppError> {
    header_value(headers, name).ok_or_else(|| {
        warn!(header = name, "Missing caller identity header");
        AppError::Unauthorized(format!("Missing {} header", name))
    })
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
