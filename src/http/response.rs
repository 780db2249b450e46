//! Response rendering.
//!
//! # Responsibilities
//! - Turn a resolved `ResponseTemplate` into an HTTP response
//! - Serve file bodies, falling back to the template body on read failure
//! - Fill in `Content-Type` for files and `charset=utf-8` for text
//!
//! # Design Decisions
//! - Invalid header names or values are skipped with a warning, not fatal
//! - An out-of-range status becomes 500 rather than a broken response
//! - Resolution failures map to one fixed plain-text 500 response

use axum::body::Body;
use axum::http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::Response;

use crate::rules::ResponseTemplate;

/// Body of the response sent when resolution fails.
pub const INTERNAL_ERROR_BODY: &str = "Internal Server Error";

const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";

/// Whether a content type carries text that should declare a charset.
pub fn is_textual(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence.starts_with("text/")
        || essence == "application/json"
        || essence == "application/javascript"
        || essence == "application/xml"
        || essence.ends_with("+json")
        || essence.ends_with("+xml")
}

/// Append `; charset=utf-8` to a textual content type that has no charset.
fn ensure_utf8_charset(headers: &mut HeaderMap) {
    let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return;
    };
    if !is_textual(content_type) || content_type.to_ascii_lowercase().contains("charset=") {
        return;
    }
    if let Ok(value) = HeaderValue::from_str(&format!("{}; charset=utf-8", content_type)) {
        headers.insert(CONTENT_TYPE, value);
    }
}

fn template_headers(template: &ResponseTemplate) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in &template.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::warn!(header = %name, "Skipping invalid response header"),
        }
    }
    headers
}

/// Render a template into a response.
pub async fn render(template: &ResponseTemplate) -> Response {
    let status = StatusCode::from_u16(template.status).unwrap_or_else(|_| {
        tracing::warn!(status = template.status, "Invalid status code in rule, sending 500");
        StatusCode::INTERNAL_SERVER_ERROR
    });
    let mut headers = template_headers(template);

    let body = match template.file_path() {
        Some(path) => match tokio::fs::read(path).await {
            Ok(bytes) => {
                if !headers.contains_key(CONTENT_TYPE) {
                    let mime = mime_guess::from_path(path).first_or_octet_stream();
                    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
                        headers.insert(CONTENT_TYPE, value);
                    }
                }
                tracing::debug!(file = %path, bytes = bytes.len(), "Serving file body");
                Body::from(bytes)
            }
            Err(e) => {
                tracing::warn!(file = %path, error = %e, "Failed to read response file, sending body");
                Body::from(template.body.clone())
            }
        },
        None => Body::from(template.body.clone()),
    };

    ensure_utf8_charset(&mut headers);

    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// The fixed response for a request whose rules could not be loaded.
pub fn internal_error_response() -> Response {
    let mut response = Response::new(Body::from(INTERNAL_ERROR_BODY));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN_UTF8));
    response
}
