//! Prefix-scoped router: route table, interceptors and nested context.

use std::fmt;
use std::sync::Arc;

use http::Method;
use serde::Serialize;
use smallvec::SmallVec;
use tracing::{debug, info};

use super::pattern::{compile, CompiledPattern};
use crate::context::Context;
use crate::error::Result;
use crate::middleware::InterceptorChain;
use crate::request::Request;
use crate::response::Response;

/// A registered request handler.
pub type HandlerFn = Arc<dyn Fn(&Request) -> Result<Response> + Send + Sync>;

/// Allowed methods of a route; empty means any method.
pub type MethodSet = SmallVec<[Method; 2]>;

/// Compiled route: methods, pattern with casters, handler.
///
/// Built once by [`Router::route`] and never modified.
pub struct RouteEntry {
    methods: MethodSet,
    pattern: CompiledPattern,
    handler: HandlerFn,
}

impl RouteEntry {
    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    #[must_use]
    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    #[must_use]
    pub fn allows(&self, method: &Method) -> bool {
        self.methods.is_empty() || self.methods.contains(method)
    }
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("methods", &self.methods)
            .field("template", &self.pattern.template())
            .finish_non_exhaustive()
    }
}

/// Context key under which a registered router finds its [`RouterInfo`].
pub const ROUTER_KEY: &str = "router";

/// Read-only description of a router, installed into the router's own
/// context when it is registered with an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouterInfo {
    pub prefix: String,
    /// Registration order within the application.
    pub position: usize,
    /// Route templates in priority order.
    pub templates: Vec<String>,
}

/// Outcome of [`Router::dispatch`].
#[derive(Debug)]
pub enum Dispatch {
    /// A route matched. `request` carries the bound path variables and
    /// router context, as seen by the handler.
    Matched { request: Request, response: Response },
    /// The router is not responsible for the request. The request is handed
    /// back, including any changes made by the router's pre-interceptors.
    NoMatch(Request),
}

impl Dispatch {
    #[must_use]
    pub fn into_response(self) -> Option<Response> {
        match self {
            Dispatch::Matched { response, .. } => Some(response),
            Dispatch::NoMatch(_) => None,
        }
    }
}

/// Routes under a common path prefix.
///
/// Routes are tried in registration order and the first one whose method set
/// and pattern accept the request wins. Registration takes `&mut self` and
/// happens before serving; dispatch takes `&self` and never mutates the table.
///
/// ```rust
/// use pigweb::{Request, Response, Router};
///
/// let mut router = Router::new("/student");
/// router
///     .get("/{name:str}/{id:int}", |req: &Request| {
///         let id = req.vars().get_int("id")?;
///         Response::json(&serde_json::json!({ "id": id }))
///     })
///     .unwrap();
///
/// let res = router
///     .dispatch(Request::get("/student/alice/42"))
///     .unwrap()
///     .into_response()
///     .unwrap();
/// assert_eq!(res.body_str(), r#"{"id":42}"#);
/// ```
pub struct Router {
    prefix: String,
    routes: Vec<RouteEntry>,
    context: Arc<Context>,
    interceptors: InterceptorChain,
}

impl Router {
    /// Create a router for `prefix`. Trailing `/` and `\` are stripped, so
    /// `"/"` becomes the empty prefix that accepts every path.
    #[must_use]
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.trim_end_matches(['/', '\\']).to_string(),
            routes: Vec::new(),
            context: Arc::new(Context::nested(None)),
            interceptors: InterceptorChain::new(),
        }
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The router's own scope. Its parent is the application context once the
    /// router is registered.
    #[must_use]
    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }

    pub fn routes(&self) -> impl Iterator<Item = &RouteEntry> {
        self.routes.iter()
    }

    /// Snapshot of this router as it would sit at `position`.
    #[must_use]
    pub fn info(&self, position: usize) -> RouterInfo {
        RouterInfo {
            prefix: self.prefix.clone(),
            position,
            templates: self
                .routes
                .iter()
                .map(|entry| entry.pattern.template().to_string())
                .collect(),
        }
    }

    /// Register `handler` for `template` and `methods` (empty = any method).
    ///
    /// The template is compiled once, here. The handler is handed back so the
    /// caller can keep using it.
    ///
    /// # Errors
    ///
    /// `DuplicatePlaceholder` or `InvalidPattern` from the template compiler.
    pub fn route<H>(&mut self, template: &str, methods: &[Method], handler: H) -> Result<Arc<H>>
    where
        H: Fn(&Request) -> Result<Response> + Send + Sync + 'static,
    {
        let pattern = compile(template)?;
        let handler = Arc::new(handler);
        debug!(
            prefix = %self.prefix,
            template = %template,
            regex = %pattern.source(),
            methods = ?methods,
            "Route registered"
        );
        self.routes.push(RouteEntry {
            methods: methods.iter().cloned().collect(),
            pattern,
            handler: Arc::clone(&handler) as HandlerFn,
        });
        Ok(handler)
    }

    /// Register a `GET` route.
    ///
    /// # Errors
    ///
    /// See [`Router::route`].
    pub fn get<H>(&mut self, template: &str, handler: H) -> Result<Arc<H>>
    where
        H: Fn(&Request) -> Result<Response> + Send + Sync + 'static,
    {
        self.route(template, &[Method::GET], handler)
    }

    /// Register a `POST` route.
    ///
    /// # Errors
    ///
    /// See [`Router::route`].
    pub fn post<H>(&mut self, template: &str, handler: H) -> Result<Arc<H>>
    where
        H: Fn(&Request) -> Result<Response> + Send + Sync + 'static,
    {
        self.route(template, &[Method::POST], handler)
    }

    /// Register a `HEAD` route.
    ///
    /// # Errors
    ///
    /// See [`Router::route`].
    pub fn head<H>(&mut self, template: &str, handler: H) -> Result<Arc<H>>
    where
        H: Fn(&Request) -> Result<Response> + Send + Sync + 'static,
    {
        self.route(template, &[Method::HEAD], handler)
    }

    /// Append a router-level pre-interceptor; runs only for paths under the prefix.
    pub fn register_pre_interceptor<F>(&mut self, interceptor: F) -> Arc<F>
    where
        F: Fn(&Context, Request) -> Result<Request> + Send + Sync + 'static,
    {
        self.interceptors.push_pre(interceptor)
    }

    /// Append a router-level post-interceptor; runs only after a route matched.
    pub fn register_post_interceptor<F>(&mut self, interceptor: F) -> Arc<F>
    where
        F: Fn(&Context, &Request, Response) -> Result<Response> + Send + Sync + 'static,
    {
        self.interceptors.push_post(interceptor)
    }

    /// Try to serve `req`.
    ///
    /// 1. Paths outside the prefix are declined without running anything.
    /// 2. Pre-interceptors run, all of them, in order.
    /// 3. The leading prefix is removed from the (possibly rewritten) path and
    ///    routes are tried in order. A path rewritten out of the prefix is
    ///    declined.
    /// 4. On the first match the captures are cast, bound to the request with
    ///    this router's context, the handler runs and post-interceptors run.
    ///
    /// # Errors
    ///
    /// * `ValueConversion` when the first matching route's captures cannot be
    ///   cast. Later routes are not tried.
    /// * Any error from an interceptor or the handler.
    pub fn dispatch(&self, req: Request) -> Result<Dispatch> {
        if !req.path.starts_with(&self.prefix) {
            return Ok(Dispatch::NoMatch(req));
        }

        let mut req = self.interceptors.run_pre(&self.context, req)?;
        let Some(local_path) = req
            .path
            .strip_prefix(self.prefix.as_str())
            .map(str::to_owned)
        else {
            debug!(
                request_id = %req.request_id,
                path = %req.path,
                prefix = %self.prefix,
                "Path moved outside prefix during pre-interceptors"
            );
            return Ok(Dispatch::NoMatch(req));
        };

        for entry in &self.routes {
            if !entry.allows(&req.method) {
                continue;
            }
            let Some(vars) = entry.pattern.captures(&local_path)? else {
                continue;
            };
            debug!(
                request_id = %req.request_id,
                method = %req.method,
                path = %req.path,
                prefix = %self.prefix,
                template = %entry.pattern.template(),
                path_vars = ?vars,
                "Route matched"
            );
            req.bind(vars, Arc::clone(&self.context));
            let res = (entry.handler)(&req)?;
            let response = self.interceptors.run_post(&self.context, &req, res)?;
            return Ok(Dispatch::Matched {
                request: req,
                response,
            });
        }

        debug!(
            request_id = %req.request_id,
            method = %req.method,
            path = %req.path,
            prefix = %self.prefix,
            "No route matched in router"
        );
        Ok(Dispatch::NoMatch(req))
    }

    /// Log the route table at `info`.
    pub fn log_routes(&self) {
        let summary: Vec<String> = self
            .routes
            .iter()
            .take(10)
            .map(|entry| format!("{:?} {}{}", entry.methods(), self.prefix, entry.pattern.template()))
            .collect();
        info!(
            prefix = %self.prefix,
            routes_count = self.routes.len(),
            pre_interceptors = self.interceptors.pre_len(),
            post_interceptors = self.interceptors.post_len(),
            routes_summary = ?summary,
            "Routing table loaded"
        );
    }

    /// Print all registered routes to stdout.
    pub fn dump_routes(&self) {
        println!("[routes] prefix={} count={}", self.prefix, self.routes.len());
        for entry in &self.routes {
            let methods = if entry.methods.is_empty() {
                "*".to_string()
            } else {
                entry
                    .methods
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(",")
            };
            println!(
                "[route] {methods} {}{} -> {}",
                self.prefix,
                entry.pattern.template(),
                entry.pattern.source()
            );
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new("/")
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("prefix", &self.prefix)
            .field("routes", &self.routes)
            .field("interceptors", &self.interceptors)
            .finish()
    }
}
