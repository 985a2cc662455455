use std::io;
use std::sync::Arc;

use may_minihttp::{HttpService, Request as WireRequest, Response as WireResponse};
use serde_json::json;
use tracing::warn;

use super::request::parse_request;
use super::response::write_response;
use crate::app::Application;
use crate::response::Response;

/// `may_minihttp` service wrapping a shared [`Application`].
///
/// One clone runs per connection; all of them read the same application.
#[derive(Clone)]
pub struct AppService {
    pub app: Arc<Application>,
}

impl AppService {
    #[must_use]
    pub fn new(app: Arc<Application>) -> Self {
        Self { app }
    }
}

impl HttpService for AppService {
    fn call(&mut self, req: WireRequest, res: &mut WireResponse) -> io::Result<()> {
        let response = match parse_request(req) {
            Ok(request) => self.app.respond(request),
            Err(failure) => {
                warn!(method = %failure.method, path = %failure.path, reason = failure.reason, "Rejected request");
                Response::json_value(&json!({
                    "error": "Bad Request",
                    "reason": failure.reason,
                }))
                .with_status(400)
            }
        };
        write_response(res, response);
        Ok(())
    }
}
