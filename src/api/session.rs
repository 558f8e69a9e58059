//! Anonymous session identity, carried in the `x-session-id` header.

use axum::{
    extract::Request,
    http::{header::HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use crate::domain::value_objects::SessionId;

pub const SESSION_HEADER: &str = "x-session-id";

/// Longest client-supplied id accepted; anything else gets a fresh one.
const MAX_SESSION_LEN: usize = 128;

fn from_header(request: &Request) -> Option<SessionId> {
    request
        .headers()
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.len() <= MAX_SESSION_LEN)
        .map(SessionId::new)
}

/// Resolves the caller's session, makes it available to handlers as an
/// `Extension<SessionId>` and echoes it on the response.
pub async fn session_middleware(mut request: Request, next: Next) -> Response {
    let session = from_header(&request).unwrap_or_else(SessionId::generate);
    request.extensions_mut().insert(session.clone());

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(session.as_str()) {
        response.headers_mut().insert(HeaderName::from_static(SESSION_HEADER), value);
    }
    response
}
