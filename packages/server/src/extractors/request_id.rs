use std::convert::Infallible;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

static LAST_ID: AtomicU64 = AtomicU64::new(0);

/// Per-request correlation id: the millisecond clock, bumped past the last
/// issued id so ids stay unique and strictly increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl RequestId {
    pub fn next() -> Self {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        let prev = LAST_ID
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        RequestId(now.max(prev + 1))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestId {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestId>()
            .copied()
            .unwrap_or_else(RequestId::next))
    }
}

/// Assigns a [`RequestId`], exposes it to handlers, renders pending error
/// bodies with it and echoes it in the `x-request-id` header.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = RequestId::next();
    request.extensions_mut().insert(request_id);
    let method = request.method().clone();
    let uri = request.uri().clone();

    let mut response = next.run(request).await;
    if response.extensions().get::<crate::error::ErrorBody>().is_some() {
        response = crate::error::render_error(response, request_id, &method, &uri);
    }

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
