//! The application: global context, registered routers, global interceptors.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::context::{Context, ContextValue};
use crate::error::{PigError, Result};
use crate::middleware::InterceptorChain;
use crate::request::Request;
use crate::response::Response;
use crate::router::{Dispatch, Router, RouterInfo, ROUTER_KEY};

/// Global context key under which handlers find the [`AppInfo`].
pub const APP_KEY: &str = "app";

/// Read-only description of the application's routing table, refreshed in
/// the global context on every [`Application::register_router`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppInfo {
    pub routers: Vec<RouterInfo>,
}

/// Entry point for request handling.
///
/// Build one at startup, register routers and interceptors, then share it
/// read-only (`Arc<Application>`) with the transport layer. Routers are
/// tried in registration order.
///
/// ```rust
/// use pigweb::{Application, Request, Response, Router};
///
/// let mut api = Router::new("/api");
/// api.get("/version", |req: &Request| {
///     let version = req.ext::<String>("version")?;
///     Ok(Response::text(version.as_str()))
/// })
/// .unwrap();
///
/// let mut app = Application::new();
/// app.register_router(api);
/// app.extend("version", String::from("1.0"));
///
/// let res = app.handle(Request::get("/api/version")).unwrap();
/// assert_eq!(res.body_str(), "1.0");
/// assert_eq!(app.respond(Request::get("/nowhere")).status, 404);
/// ```
pub struct Application {
    context: Arc<Context>,
    routers: Vec<Router>,
    interceptors: InterceptorChain,
}

impl Application {
    #[must_use]
    pub fn new() -> Self {
        Self {
            context: Arc::new(Context::new()),
            routers: Vec::new(),
            interceptors: InterceptorChain::new(),
        }
    }

    /// Create an application whose global context starts with `values`.
    #[must_use]
    pub fn with_context<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, ContextValue)>,
        K: Into<String>,
    {
        let app = Self::new();
        for (key, value) in values {
            app.context.insert_value(key, value);
        }
        app
    }

    /// The global context every router falls back to.
    #[must_use]
    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }

    #[must_use]
    pub fn routers(&self) -> &[Router] {
        &self.routers
    }

    /// Descriptions of the registered routers, in priority order.
    #[must_use]
    pub fn info(&self) -> AppInfo {
        AppInfo {
            routers: self
                .routers
                .iter()
                .enumerate()
                .map(|(position, router)| router.info(position))
                .collect(),
        }
    }

    /// Link the router's context to the global context and append it.
    ///
    /// The router's context receives its [`RouterInfo`] under
    /// [`ROUTER_KEY`]; the global context's [`AppInfo`] under [`APP_KEY`] is
    /// replaced with one that lists the new router.
    pub fn register_router(&mut self, router: Router) -> &Router {
        router.context().relate(Some(Arc::clone(&self.context)));
        let info = router.info(self.routers.len());
        router.context().insert(ROUTER_KEY, info.clone());
        let mut app_info = self.info();
        app_info.routers.push(info);
        self.context.insert(APP_KEY, app_info);
        info!(
            prefix = %router.prefix(),
            routes_count = router.routes().count(),
            position = self.routers.len(),
            "Router registered"
        );
        self.routers.push(router);
        &self.routers[self.routers.len() - 1]
    }

    /// Append a global pre-interceptor, run before any router is consulted.
    pub fn register_pre_interceptor<F>(&mut self, interceptor: F) -> Arc<F>
    where
        F: Fn(&Context, Request) -> Result<Request> + Send + Sync + 'static,
    {
        self.interceptors.push_pre(interceptor)
    }

    /// Append a global post-interceptor, run on the matched router's response.
    pub fn register_post_interceptor<F>(&mut self, interceptor: F) -> Arc<F>
    where
        F: Fn(&Context, &Request, Response) -> Result<Response> + Send + Sync + 'static,
    {
        self.interceptors.push_post(interceptor)
    }

    /// Install a named extension (database handle, settings, ...) into the
    /// global context, visible to every router and handler.
    pub fn extend<T>(&self, name: impl Into<String>, value: T)
    where
        T: Any + Send + Sync,
    {
        self.context.insert(name, value);
    }

    /// Route `req` and return the response.
    ///
    /// # Errors
    ///
    /// * `PigError::NotFound` when no router produced a response
    /// * anything raised by interceptors, casters or handlers
    pub fn handle(&self, req: Request) -> Result<Response> {
        let mut req = self.interceptors.run_pre(&self.context, req)?;

        for router in &self.routers {
            match router.dispatch(req)? {
                Dispatch::Matched { request, response } => {
                    return self.interceptors.run_post(&self.context, &request, response);
                }
                Dispatch::NoMatch(declined) => req = declined,
            }
        }

        Err(PigError::NotFound {
            method: req.method.to_string(),
            path: req.path,
        })
    }

    /// [`Application::handle`] with errors rendered as responses: 404 for an
    /// unmatched request, 500 for everything else.
    pub fn respond(&self, req: Request) -> Response {
        let request_id = req.request_id;
        let method = req.method.clone();
        let path = req.path.clone();
        match self.handle(req) {
            Ok(res) => res,
            Err(err @ PigError::NotFound { .. }) => {
                warn!(request_id = %request_id, method = %method, path = %path, "No route matched");
                Response::from_error(&err)
            }
            Err(err) => {
                error!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    error = %err,
                    "Request failed"
                );
                Response::from_error(&err)
            }
        }
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("context", &self.context)
            .field("routers", &self.routers)
            .field("interceptors", &self.interceptors)
            .finish()
    }
}
