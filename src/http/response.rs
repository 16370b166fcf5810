//! Canned responses produced by the balancer itself.
//!
//! Backend responses are relayed untouched; these cover the cases where no
//! backend response exists.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// The write path acknowledgment: accepted, no content.
pub fn accepted() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Upstream connection, DNS or protocol failure on the proxy path.
pub fn bad_gateway() -> Response {
    (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
}

/// A request-level failure with a plain-text reason.
pub fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, message.into()).into_response()
}
