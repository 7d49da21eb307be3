//! Per-request correlation ids
//!
//! Every request carries a UUID through its whole lifecycle: handlers read
//! it from extensions for structured log fields, and clients get it back
//! in the response headers. A caller that already has a correlation id can
//! supply one; anything that does not parse as a UUID is replaced.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use uuid::Uuid;

/// Header carrying the request id in both directions
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request ID wrapper type for Axum extensions
#[derive(Debug, Clone, Copy)]
pub struct RequestId(pub Uuid);

impl RequestId {
    /// Generate a new random request ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The inbound header value, if it holds a valid UUID
    fn from_request(request: &Request) -> Option<Self> {
        let header = request.headers().get(REQUEST_ID_HEADER)?;
        let parsed = Uuid::parse_str(header.to_str().ok()?).ok()?;
        Some(Self(parsed))
    }

    /// Get the UUID value
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Middleware attaching a request id to each request and response
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = RequestId::from_request(&request).unwrap_or_default();

    tracing::debug!(
        request_id = %request_id,
        method = %request.method(),
        uri = %request.uri(),
        "Incoming request"
    );

    request.extensions_mut().insert(request_id);

    let mut response = next.run(request).await;

    if let Ok(header_value) = HeaderValue::from_str(&request_id.to_string()) {
        response
            .headers_mut()
            .insert(REQUEST_ID_HEADER, header_value);
    }

    response
}
