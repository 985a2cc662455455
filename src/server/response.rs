use dashmap::DashMap;
use may_minihttp::Response as WireResponse;
use once_cell::sync::Lazy;

use crate::response::{Response, CONTENT_TYPE_HTML, CONTENT_TYPE_JSON, CONTENT_TYPE_TEXT};

/// `may_minihttp` wants `&'static str` header lines. Content types are
/// `&'static str` already, so each distinct one is formatted once and kept.
static CONTENT_TYPE_HEADERS: Lazy<DashMap<&'static str, &'static str>> = Lazy::new(DashMap::new);

/// Standard reason phrase for `status`.
#[must_use]
pub fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

fn content_type_header(content_type: &'static str) -> &'static str {
    match content_type {
        CONTENT_TYPE_JSON => "Content-Type: application/json",
        CONTENT_TYPE_TEXT => "Content-Type: text/plain; charset=utf-8",
        CONTENT_TYPE_HTML => "Content-Type: text/html; charset=utf-8",
        other => *CONTENT_TYPE_HEADERS
            .entry(other)
            .or_insert_with(|| &*Box::leak(format!("Content-Type: {other}").into_boxed_str())),
    }
}

/// Write status line, `Content-Type` and body.
pub fn write_response(res: &mut WireResponse, response: Response) {
    res.status_code(usize::from(response.status), status_reason(response.status));
    res.header(content_type_header(response.content_type));
    res.body_vec(response.body);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reason() {
        assert_eq!(status_reason(200), "OK");
        assert_eq!(status_reason(404), "Not Found");
        assert_eq!(status_reason(500), "Internal Server Error");
        assert_eq!(status_reason(299), "Unknown");
    }

    #[test]
    fn test_content_type_header() {
        assert_eq!(
            content_type_header(CONTENT_TYPE_JSON),
            "Content-Type: application/json"
        );
        let first = content_type_header("image/png");
        let second = content_type_header("image/png");
        assert_eq!(first, "Content-Type: image/png");
        assert!(std::ptr::eq(first, second));
    }
}
