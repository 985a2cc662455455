//! `may_minihttp` transport for an [`Application`](crate::Application).
//!
//! [`AppService`] adapts each wire request into a [`crate::Request`], lets the
//! application route it and writes the [`crate::Response`] back.
//! [`HttpServer::serve`] starts the coroutine server for a shared application
//! and hands out a [`ServerHandle`].

pub mod http_server;
pub mod request;
pub mod response;
pub mod service;

pub use http_server::{HttpServer, ServerHandle, MAX_HEADERS, READY_TIMEOUT};
pub use request::{parse_request, ParseFailure};
pub use response::{status_reason, write_response};
pub use service::AppService;
