//! # Router Module
//!
//! Path matching and dispatch for pigweb.
//!
//! ## Overview
//!
//! A [`Router`] owns an ordered table of routes under a path prefix. Each
//! route is compiled from a template with typed placeholders:
//!
//! ```text
//! /student/{name:str}/{id:int}
//!     → ^(?:/student/(?P<name>[^/]+)/(?P<id>[+-]?\d+))$
//!     → casters: name → str, id → int
//! ```
//!
//! ## Architecture
//!
//! 1. **Compilation**: at registration, [`pattern::compile`] turns the template
//!    into a regex plus a caster table. Nothing is compiled per request.
//!
//! 2. **Matching**: [`Router::dispatch`] checks the prefix, runs the router's
//!    pre-interceptors, strips the prefix and tries each route in
//!    registration order. The first match has its captures cast into
//!    [`PathVars`], attached to the request, and its handler invoked.
//!
//! A cast failure on the first matching route fails the whole dispatch;
//! later routes are not tried.

mod core;
pub mod pattern;
mod vars;

pub use self::core::{Dispatch, HandlerFn, MethodSet, RouteEntry, Router, RouterInfo, ROUTER_KEY};
pub use self::pattern::{compile, CasterTable, CompiledPattern, PlaceholderKind};
pub use self::vars::{ParamVec, PathValue, PathVars, MAX_INLINE_PARAMS};
