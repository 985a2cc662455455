//! Response type and JSON helper.

use std::borrow::Cow;

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{PigError, Result};

pub const CONTENT_TYPE_HTML: &str = "text/html; charset=utf-8";
pub const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Status, content type and body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Response {
    #[must_use]
    pub fn new(status: u16, content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type,
            body: body.into(),
        }
    }

    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        Self::new(200, CONTENT_TYPE_TEXT, body.into())
    }

    #[must_use]
    pub fn html(body: impl Into<String>) -> Self {
        Self::new(200, CONTENT_TYPE_HTML, body.into())
    }

    /// Serialize `value` as a JSON response.
    ///
    /// # Errors
    ///
    /// Propagates a `serde_json` failure (e.g. a map with non-string keys).
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let body = serde_json::to_vec(value).map_err(anyhow::Error::from)?;
        Ok(Self::new(200, CONTENT_TYPE_JSON, body))
    }

    /// JSON response from an already built `Value`; cannot fail.
    #[must_use]
    pub fn json_value(value: &Value) -> Self {
        Self::new(200, CONTENT_TYPE_JSON, value.to_string())
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Error body rendered by the application boundary.
    #[must_use]
    pub fn from_error(err: &PigError) -> Self {
        let body = match err {
            PigError::NotFound { method, path } => {
                json!({ "error": "Not Found", "method": method, "path": path })
            }
            _ => json!({ "error": "Internal Server Error" }),
        };
        Self::json_value(&body).with_status(err.status())
    }

    #[must_use]
    pub fn body_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}
