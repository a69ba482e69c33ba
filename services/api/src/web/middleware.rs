//! services/api/src/web/middleware.rs
//!
//! Identifies the caller for routes that work on a user's journal.

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Middleware that reads the opaque user id from the `x-user-id` header.
///
/// If valid, inserts the user_id into request extensions for handlers to use.
/// If missing or malformed, returns 400 Bad Request.
pub async fn require_user(mut req: Request, next: Next) -> Result<Response, (StatusCode, String)> {
    let raw = req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                format!("{} header is required", USER_ID_HEADER),
            )
        })?;

    let user_id = Uuid::parse_str(raw.trim()).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            format!("Invalid {} format", USER_ID_HEADER),
        )
    })?;

    req.extensions_mut().insert(user_id);
    Ok(next.run(req).await)
}
