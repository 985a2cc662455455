//! Interceptor chains and the stock interceptors shipped with the crate.
//!
//! An interceptor is a plain function or closure. Pre-interceptors take
//! `(&Context, Request)` and return the request to continue with;
//! post-interceptors take `(&Context, &Request, Response)` and return the
//! response to continue with.

mod core;
mod metrics;
mod tracing;

pub use self::core::{InterceptorChain, PostInterceptorFn, PreInterceptorFn};
pub use self::metrics::RequestMetrics;
pub use self::tracing::{access_log, trace_entry};
