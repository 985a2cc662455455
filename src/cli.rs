//! Command line entry point of the `pigweb` demo server.
//!
//! The demo wires two routers into one application:
//!
//! * `/student` - typed path variables: `GET /student/{name:str}/{id:int}`
//! * `/api` - `ping`, float item lookup, request counters and an echo,
//!   reachable with or without a `/v1` segment
//!
//! plus a catch-all router on `/` serving `GET /files/{path:any}`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use serde_json::json;
use tracing::info;

use crate::app::Application;
use crate::config::ServerConfig;
use crate::context::{Context, ContextValue};
use crate::logging::{init_logging_with_config, LogConfig};
use crate::middleware::{access_log, trace_entry, RequestMetrics};
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::server::{HttpServer, READY_TIMEOUT};

#[derive(Debug, Parser)]
#[command(name = "pigweb")]
#[command(about = "pigweb demo server", long_about = None)]
pub struct Cli {
    /// Listen address; overrides the config file and PIGWEB_ADDR
    #[arg(long)]
    pub addr: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the route tables and exit
    #[arg(long, default_value_t = false)]
    pub dump_routes: bool,
}

impl Cli {
    /// Layer the flags on top of file and environment configuration.
    ///
    /// # Errors
    ///
    /// Config file or environment problems, see [`ServerConfig::resolve`].
    pub fn server_config(&self) -> anyhow::Result<ServerConfig> {
        let mut config = ServerConfig::resolve(self.config.as_deref())?;
        if let Some(addr) = &self.addr {
            config.addr.clone_from(addr);
        }
        Ok(config)
    }
}

/// Build the demo application.
///
/// # Errors
///
/// Route registration errors.
pub fn demo_app(metrics: &Arc<RequestMetrics>) -> crate::Result<Application> {
    let mut app = Application::with_context([
        ("service", Arc::new(String::from("pigweb")) as ContextValue),
        ("metrics", Arc::clone(metrics) as ContextValue),
    ]);
    app.register_pre_interceptor(metrics.pre_hook());
    app.register_pre_interceptor(trace_entry);
    app.register_post_interceptor(metrics.post_hook());
    app.register_post_interceptor(access_log);

    let mut student = Router::new("/student");
    student.get("/{name:str}/{id:int}", |req: &Request| {
        let vars = req.vars();
        Response::json(&json!({
            "name": vars.get_str("name")?,
            "id": vars.get_int("id")?,
        }))
    })?;
    app.register_router(student);

    let mut api = Router::new("/api");
    api.register_pre_interceptor(|_ctx: &Context, mut req: Request| {
        if let Some(rest) = req.path.strip_prefix("/api/v1/") {
            req.path = format!("/api/{rest}");
        }
        Ok(req)
    });
    api.get("/ping", |_req: &Request| Ok(Response::text("pong")))?;
    api.get("/item/{id:float}", |req: &Request| {
        let id = req.vars().get_float("id")?;
        let service = req.ext::<String>("service")?;
        Response::json(&json!({ "id": id, "service": service.as_str() }))
    })?;
    api.get("/metrics", |req: &Request| {
        let metrics = req.ext::<RequestMetrics>("metrics")?;
        Response::json(&json!({
            "requests": metrics.request_count(),
            "responses": metrics.response_count(),
            "client_errors": metrics.client_error_count(),
            "server_errors": metrics.server_error_count(),
        }))
    })?;
    api.post("/echo", |req: &Request| {
        Ok(Response::text(String::from_utf8_lossy(&req.body).into_owned()))
    })?;
    app.register_router(api);

    let mut files = Router::new("/");
    files.get("/files/{path:any}", |req: &Request| {
        let path = req.vars().get_str("path")?;
        Ok(Response::html(format!("<p>{path}</p>")))
    })?;
    app.register_router(files);

    Ok(app)
}

/// Parse flags, set up logging and the coroutine runtime, then serve until
/// the server stops.
///
/// # Errors
///
/// Configuration, logging, route registration or bind failures.
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.server_config()?;

    let mut log_config = LogConfig::from_env();
    log_config.log_level.clone_from(&config.log_level);
    init_logging_with_config(&log_config)?;

    may::config().set_stack_size(config.stack_size);
    info!(
        addr = %config.addr,
        stack_size = config.stack_size,
        "Coroutine runtime configured"
    );

    let metrics = Arc::new(RequestMetrics::new());
    let app = demo_app(&metrics).context("Failed to build application")?;

    if cli.dump_routes {
        for router in app.routers() {
            router.dump_routes();
        }
        return Ok(());
    }
    for router in app.routers() {
        router.log_routes();
    }

    let handle = HttpServer::serve(Arc::new(app), config.addr.as_str())
        .with_context(|| format!("Failed to bind {}", config.addr))?;
    handle
        .wait_ready(READY_TIMEOUT)
        .context("Server did not become ready")?;
    handle
        .join()
        .map_err(|_| anyhow::anyhow!("Server coroutine panicked"))?;
    Ok(())
}
