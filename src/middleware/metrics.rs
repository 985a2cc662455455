use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::context::Context;
use crate::error::Result;
use crate::request::Request;
use crate::response::Response;

/// Request and response counters fed by a pre/post interceptor pair.
///
/// All counters are atomics, so one instance can be shared by every server
/// coroutine without locking.
///
/// ```rust
/// use std::sync::Arc;
/// use pigweb::{Application, middleware::RequestMetrics};
///
/// let metrics = Arc::new(RequestMetrics::new());
/// let mut app = Application::new();
/// app.register_pre_interceptor(metrics.pre_hook());
/// app.register_post_interceptor(metrics.post_hook());
/// ```
#[derive(Debug, Default)]
pub struct RequestMetrics {
    requests: AtomicUsize,
    responses: AtomicUsize,
    client_errors: AtomicUsize,
    server_errors: AtomicUsize,
}

impl RequestMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that entered the chain this instance is installed on.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }

    /// Responses that left the chain (requests that matched a route).
    #[must_use]
    pub fn response_count(&self) -> usize {
        self.responses.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn client_error_count(&self) -> usize {
        self.client_errors.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn server_error_count(&self) -> usize {
        self.server_errors.load(Ordering::Relaxed)
    }

    fn record(&self, status: u16) {
        self.responses.fetch_add(1, Ordering::Relaxed);
        match status {
            400..=499 => {
                self.client_errors.fetch_add(1, Ordering::Relaxed);
            }
            500..=599 => {
                self.server_errors.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }

    /// Pre-interceptor counting incoming requests.
    pub fn pre_hook(
        self: &Arc<Self>,
    ) -> impl Fn(&Context, Request) -> Result<Request> + Send + Sync + 'static {
        let metrics = Arc::clone(self);
        move |_ctx: &Context, req: Request| {
            metrics.requests.fetch_add(1, Ordering::Relaxed);
            Ok(req)
        }
    }

    /// Post-interceptor counting responses by status class.
    pub fn post_hook(
        self: &Arc<Self>,
    ) -> impl Fn(&Context, &Request, Response) -> Result<Response> + Send + Sync + 'static {
        let metrics = Arc::clone(self);
        move |_ctx: &Context, _req: &Request, res: Response| {
            metrics.record(res.status);
            Ok(res)
        }
    }
}
