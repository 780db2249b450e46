//! Request handling.
//!
//! # Responsibilities
//! - Generate a unique request ID when the client did not send one
//! - Extract the routing-relevant view of a request (method, host, path)
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Host header first, URI authority second (HTTP/2 carries no Host)
//! - Path excludes the query string; rules never see it
//! - Rules match the percent-decoded path; the raw path is kept for logs

use axum::http::{header, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::rules::RequestView;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Owned copy of the request fields the rule engine needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget {
    pub method: String,
    pub host: String,
    /// Percent-decoded path, as rules are written.
    pub path: String,
    /// Path exactly as it appeared on the request line.
    pub raw_path: String,
    pub query: Option<String>,
}

impl RequestTarget {
    pub fn from_request<B>(request: &Request<B>) -> Self {
        let raw_path = request.uri().path();
        Self {
            method: request.method().as_str().to_string(),
            host: request_host(request).unwrap_or_default().to_string(),
            path: decode_path(raw_path),
            raw_path: raw_path.to_string(),
            query: request.uri().query().map(str::to_string),
        }
    }

    pub fn view(&self) -> RequestView<'_> {
        RequestView {
            method: &self.method,
            host: &self.host,
            path: &self.path,
        }
    }
}

/// Percent-decode a request path. Invalid UTF-8 is replaced, `+` stays literal.
pub fn decode_path(raw: &str) -> String {
    let bytes = urlencoding::decode_binary(raw.as_bytes());
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Host the client addressed, with port if it sent one.
pub fn request_host<B>(request: &Request<B>) -> Option<&str> {
    request
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| {
            request.uri().authority().map(|authority| {
                let authority = authority.as_str();
                authority
                    .rsplit_once('@')
                    .map(|(_userinfo, host)| host)
                    .unwrap_or(authority)
            })
        })
}
