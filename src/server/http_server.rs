use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use may::coroutine::JoinHandle;
use may_minihttp::HttpServerWithHeaders;
use tracing::{debug, info, warn};

use super::service::AppService;
use crate::app::Application;

/// Most request headers accepted per message.
pub const MAX_HEADERS: usize = 32;

/// Default budget for [`ServerHandle::wait_ready`].
pub const READY_TIMEOUT: Duration = Duration::from_millis(250);

const READY_POLL: Duration = Duration::from_millis(5);

/// Serves one [`Application`] over `may_minihttp`.
///
/// ```no_run
/// use std::sync::Arc;
/// use pigweb::{server::HttpServer, Application};
///
/// let handle = HttpServer::serve(Arc::new(Application::new()), "127.0.0.1:8080")?;
/// handle.wait_ready(pigweb::server::READY_TIMEOUT)?;
/// handle.shutdown();
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct HttpServer {
    app: Arc<Application>,
}

impl HttpServer {
    #[must_use]
    pub fn new(app: Arc<Application>) -> Self {
        Self { app }
    }

    /// Shorthand for `HttpServer::new(app).start(addr)`.
    ///
    /// # Errors
    ///
    /// See [`HttpServer::start`].
    pub fn serve<A: ToSocketAddrs>(app: Arc<Application>, addr: A) -> io::Result<ServerHandle> {
        Self::new(app).start(addr)
    }

    /// Bind the first address `addr` resolves to and start the accept loop.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `addr` resolves to nothing, otherwise the bind error.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        let addr = addr.to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "address resolved to nothing")
        })?;
        let prefixes: Vec<String> = self
            .app
            .routers()
            .iter()
            .map(|router| router.prefix().to_string())
            .collect();
        let handle =
            HttpServerWithHeaders::<_, MAX_HEADERS>(AppService::new(self.app)).start(addr)?;
        info!(
            addr = %addr,
            routers = ?prefixes,
            max_headers = MAX_HEADERS,
            "pigweb listening"
        );
        Ok(ServerHandle {
            addr,
            started: Instant::now(),
            handle,
        })
    }
}

/// A running server.
pub struct ServerHandle {
    addr: SocketAddr,
    started: Instant,
    handle: JoinHandle<()>,
}

impl ServerHandle {
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Block until the listener accepts a TCP connection or `timeout` passes.
    ///
    /// # Errors
    ///
    /// `TimedOut` when no connection succeeded within `timeout`.
    pub fn wait_ready(&self, timeout: Duration) -> io::Result<()> {
        let deadline = Instant::now() + timeout;
        let mut attempts = 0_u32;
        loop {
            attempts += 1;
            if TcpStream::connect(self.addr).is_ok() {
                debug!(
                    addr = %self.addr,
                    attempts,
                    startup_ms = self.started.elapsed().as_millis() as u64,
                    "pigweb ready"
                );
                return Ok(());
            }
            if Instant::now() >= deadline {
                warn!(addr = %self.addr, attempts, "pigweb did not become ready");
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("server at {} not ready after {timeout:?}", self.addr),
                ));
            }
            thread::sleep(READY_POLL);
        }
    }

    /// Cancel the accept loop and wait for it to exit.
    pub fn shutdown(self) {
        // SAFETY: the handle is owned here and cancellation only unwinds the
        // accept coroutine at its next yield point.
        unsafe {
            self.handle.coroutine().cancel();
        }
        let clean = self.handle.join().is_ok();
        info!(
            addr = %self.addr,
            uptime_ms = self.started.elapsed().as_millis() as u64,
            clean,
            "pigweb stopped"
        );
    }

    /// Block until the accept loop ends.
    ///
    /// # Errors
    ///
    /// The panic payload if the server coroutine panicked.
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }
}
