use std::collections::HashMap;
use std::fmt;
use std::io::Read;

use http::Method;
use may_minihttp::Request as WireRequest;
use tracing::{debug, warn};

use crate::ids::{RequestId, X_REQUEST_ID};
use crate::request::Request;

/// Why a wire request could not be turned into a [`Request`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub method: String,
    pub path: String,
    pub reason: &'static str,
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} for {} {}", self.reason, self.method, self.path)
    }
}

impl std::error::Error for ParseFailure {}

/// Read method, target, headers and body off a `may_minihttp` request.
///
/// # Errors
///
/// [`ParseFailure`] when the method is not a valid HTTP token or the body
/// cannot be read.
pub fn parse_request(req: WireRequest) -> Result<Request, ParseFailure> {
    let method = req.method().to_string();
    let target = req.path().to_string();
    let headers: Vec<(String, Vec<u8>)> = req
        .headers()
        .iter()
        .map(|h| (h.name.to_string(), h.value.to_vec()))
        .collect();

    let mut body = Vec::new();
    if let Err(err) = req.body().read_to_end(&mut body) {
        warn!(method = %method, target = %target, error = %err, "Failed to read request body");
        return Err(ParseFailure {
            method,
            path: target,
            reason: "unreadable request body",
        });
    }

    build_request(
        &method,
        &target,
        headers.iter().map(|(name, value)| (name.as_str(), value.as_slice())),
        body,
    )
}

/// Assemble a [`Request`] from raw parts.
///
/// Header names are lowercased, values decoded lossily. A well-formed
/// `x-request-id` header is kept as the request id.
///
/// # Errors
///
/// [`ParseFailure`] when `method` is not a valid HTTP method token.
pub fn build_request<'a, I>(
    method: &str,
    target: &str,
    headers: I,
    body: Vec<u8>,
) -> Result<Request, ParseFailure>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let method_token = Method::from_bytes(method.as_bytes()).map_err(|_| ParseFailure {
        method: method.to_string(),
        path: target.to_string(),
        reason: "invalid method",
    })?;

    let headers: HashMap<String, String> = headers
        .into_iter()
        .map(|(name, value)| {
            (
                name.to_ascii_lowercase(),
                String::from_utf8_lossy(value).into_owned(),
            )
        })
        .collect();
    let request_id = RequestId::from_header_or_new(headers.get(X_REQUEST_ID).map(String::as_str));

    let mut req = Request::new(method_token, target).with_request_id(request_id);
    req.headers = headers;
    req.body = body;

    debug!(
        request_id = %req.request_id,
        method = %req.method,
        path = %req.path,
        headers_count = req.headers.len(),
        query_count = req.query_params.len(),
        body_size_bytes = req.body.len(),
        "HTTP request parsed"
    );
    Ok(req)
}
