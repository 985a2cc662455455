use tracing::info;

use crate::context::Context;
use crate::error::Result;
use crate::request::Request;
use crate::response::Response;

/// Post-interceptor emitting one `info` event per routed request.
pub fn access_log(_ctx: &Context, req: &Request, res: Response) -> Result<Response> {
    info!(
        request_id = %req.request_id,
        method = %req.method,
        path = %req.path,
        status = res.status,
        path_vars = req.vars().len(),
        body_bytes = res.body.len(),
        "Request served"
    );
    Ok(res)
}

/// Pre-interceptor emitting a `debug` event when a request enters a scope.
pub fn trace_entry(_ctx: &Context, req: Request) -> Result<Request> {
    tracing::debug!(
        request_id = %req.request_id,
        method = %req.method,
        path = %req.path,
        "Request entering interceptor chain"
    );
    Ok(req)
}
