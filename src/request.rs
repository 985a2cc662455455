//! Transport-agnostic request passed through interceptors and handlers.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use http::Method;

use crate::context::Context;
use crate::error::{PigError, Result};
use crate::ids::RequestId;
use crate::router::PathVars;

/// An incoming request.
///
/// The wire-level fields are public so interceptors can rewrite them. The
/// typed path variables and the bound router context are only set by the
/// router once a route matched.
#[derive(Debug, Clone)]
pub struct Request {
    /// Correlation id for logs
    pub request_id: RequestId,
    pub method: Method,
    /// Path without the query string
    pub path: String,
    pub query_params: HashMap<String, String>,
    /// Header names are lowercase
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    vars: PathVars,
    context: Option<Arc<Context>>,
}

impl Request {
    /// Build a request from a method and a raw target such as `/pets?limit=10`.
    ///
    /// The query string is split off and decoded into `query_params`.
    #[must_use]
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query_params) = match target.split_once('?') {
            Some((path, query)) => (path.to_string(), parse_query(query)),
            None => (target.to_string(), HashMap::new()),
        };
        Self {
            request_id: RequestId::new(),
            method,
            path,
            query_params,
            headers: HashMap::new(),
            body: Vec::new(),
            vars: PathVars::default(),
            context: None,
        }
    }

    #[must_use]
    pub fn get(target: &str) -> Self {
        Self::new(Method::GET, target)
    }

    #[must_use]
    pub fn post(target: &str) -> Self {
        Self::new(Method::POST, target)
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub fn with_request_id(mut self, id: RequestId) -> Self {
        self.request_id = id;
        self
    }

    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    #[must_use]
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }

    /// Typed path variables of the matched route. Empty before routing.
    #[must_use]
    pub fn vars(&self) -> &PathVars {
        &self.vars
    }

    /// Context of the router that matched this request.
    #[must_use]
    pub fn context(&self) -> Option<&Arc<Context>> {
        self.context.as_ref()
    }

    /// Typed lookup through the bound router context and its parents, which
    /// is how handlers reach values installed with `Application::extend`.
    ///
    /// # Errors
    ///
    /// `PigError::AttributeNotFound` if the request has not been routed yet or
    /// the key is undefined; `PigError::TypeMismatch` on a type mismatch.
    pub fn ext<T>(&self, key: &str) -> Result<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        match &self.context {
            Some(ctx) => ctx.get::<T>(key),
            None => Err(PigError::AttributeNotFound {
                key: key.to_string(),
            }),
        }
    }

    pub(crate) fn bind(&mut self, vars: PathVars, context: Arc<Context>) {
        self.vars = vars;
        self.context = Some(context);
    }
}

/// Decode `a=1&b=two` into a map. Later duplicates win.
pub fn parse_query(query: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_is_split_from_path() {
        let req = Request::get("/pets?limit=10&name=rex%20jr");
        assert_eq!(req.path, "/pets");
        assert_eq!(req.query("limit"), Some("10"));
        assert_eq!(req.query("name"), Some("rex jr"));
        assert_eq!(req.query("missing"), None);
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let req = Request::post("/x").with_header("X-Token", "abc");
        assert_eq!(req.header("x-token"), Some("abc"));
        assert_eq!(req.header("X-TOKEN"), Some("abc"));
        assert_eq!(req.method, Method::POST);
    }

    #[test]
    fn test_unrouted_request_has_no_context() {
        let req = Request::get("/");
        assert!(req.context().is_none());
        assert!(req.vars().is_empty());
        assert!(matches!(
            req.ext::<String>("db"),
            Err(PigError::AttributeNotFound { .. })
        ));
    }

    #[test]
    fn test_ext_reads_bound_context() {
        let ctx = Arc::new(Context::new());
        ctx.insert("db", "sqlite::memory:".to_string());
        let mut req = Request::get("/");
        req.bind(PathVars::default(), ctx);
        assert_eq!(req.ext::<String>("db").unwrap().as_str(), "sqlite::memory:");
    }
}
