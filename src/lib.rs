//! # pigweb
//!
//! **pigweb** is a small HTTP routing layer: typed path templates, prefix
//! scoped routers, a pre/post interceptor chain at both application and router
//! level, and a scoped context with parent fallback for sharing extensions
//! with handlers. HTTP transport is delegated to `may_minihttp`.
//!
//! ## Architecture
//!
//! - **[`router::pattern`]** - compiles `/student/{name:str}/{id:int}` into an
//!   anchored regex plus a caster table
//! - **[`router`]** - [`Router`]: ordered route table under a prefix, own
//!   interceptors and nested [`Context`]
//! - **[`context`]** - key/value scope with explicit parent lookup
//! - **[`app`]** - [`Application`]: global context, routers in priority order,
//!   global interceptors, 404 on exhaustion
//! - **[`middleware`]** - interceptor chains and stock interceptors
//! - **[`server`]** - `may_minihttp` service adapter and server handle
//! - **[`logging`]**, **[`config`]**, **[`cli`]** - setup for binaries and the demo server
//!
//! ### Request Handling Flow
//!
//! ```text
//! Request
//!   → global pre-interceptors
//!   → for each router, in registration order:
//!       prefix check → router pre-interceptors → strip prefix
//!       → first route whose methods and pattern match
//!       → cast path variables → handler → router post-interceptors
//!   → global post-interceptors
//!   → Response            (no router matched → PigError::NotFound → 404)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use pigweb::{Application, Request, Response, Router};
//!
//! let mut students = Router::new("/student");
//! students
//!     .get("/{name:str}/{id:int}", |req: &Request| Response::json(req.vars()))
//!     .unwrap();
//!
//! let mut app = Application::new();
//! app.register_router(students);
//!
//! let res = app.respond(Request::get("/student/alice/42"));
//! assert_eq!(res.status, 200);
//! assert_eq!(res.body_str(), r#"{"name":"alice","id":42}"#);
//! ```

pub mod app;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod request;
pub mod response;
pub mod router;
pub mod server;

pub use app::{AppInfo, Application, APP_KEY};
pub use context::{Context, ContextValue};
pub use error::{PigError, Result};
pub use ids::RequestId;
pub use request::Request;
pub use response::Response;
pub use router::{Dispatch, PathValue, PathVars, PlaceholderKind, Router, RouterInfo, ROUTER_KEY};
