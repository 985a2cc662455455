use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::error::Result;
use crate::request::Request;
use crate::response::Response;

/// Runs before dispatch. Receives the scope's context and the request and
/// returns the request to continue with (possibly rewritten).
pub type PreInterceptorFn = Arc<dyn Fn(&Context, Request) -> Result<Request> + Send + Sync>;

/// Runs after the handler. Receives the scope's context, the routed request
/// and the response so far, and returns the response to continue with.
pub type PostInterceptorFn =
    Arc<dyn Fn(&Context, &Request, Response) -> Result<Response> + Send + Sync>;

/// Ordered pre and post interceptor lists.
///
/// Both the application and every router own one. Interceptors run in
/// registration order and every one of them runs; the first error aborts the
/// chain and propagates.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    pre: Vec<PreInterceptorFn>,
    post: Vec<PostInterceptorFn>,
}

impl InterceptorChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pre-interceptor and hand it back.
    pub fn push_pre<F>(&mut self, interceptor: F) -> Arc<F>
    where
        F: Fn(&Context, Request) -> Result<Request> + Send + Sync + 'static,
    {
        let interceptor = Arc::new(interceptor);
        self.pre.push(Arc::clone(&interceptor) as PreInterceptorFn);
        interceptor
    }

    /// Append a post-interceptor and hand it back.
    pub fn push_post<F>(&mut self, interceptor: F) -> Arc<F>
    where
        F: Fn(&Context, &Request, Response) -> Result<Response> + Send + Sync + 'static,
    {
        let interceptor = Arc::new(interceptor);
        self.post.push(Arc::clone(&interceptor) as PostInterceptorFn);
        interceptor
    }

    /// Thread `req` through every pre-interceptor in order.
    ///
    /// # Errors
    ///
    /// The first interceptor error.
    pub fn run_pre(&self, ctx: &Context, req: Request) -> Result<Request> {
        self.pre.iter().try_fold(req, |req, interceptor| interceptor(ctx, req))
    }

    /// Thread `res` through every post-interceptor in order.
    ///
    /// # Errors
    ///
    /// The first interceptor error.
    pub fn run_post(&self, ctx: &Context, req: &Request, res: Response) -> Result<Response> {
        self.post
            .iter()
            .try_fold(res, |res, interceptor| interceptor(ctx, req, res))
    }

    #[must_use]
    pub fn pre_len(&self) -> usize {
        self.pre.len()
    }

    #[must_use]
    pub fn post_len(&self) -> usize {
        self.post.len()
    }
}

impl fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("pre", &self.pre.len())
            .field("post", &self.post.len())
            .finish()
    }
}
