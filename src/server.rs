//! HTTP server lifecycle and graceful shutdown.
//!
//! # Lifecycle
//!
//! ```text
//! Starting ──start()──▶ Serving ──cancel / SIGTERM / SIGINT──▶ ShuttingDown ──▶ Stopped
//! ```
//!
//! [`Server::start`] binds the socket and launches the accept loop on its own
//! task, then returns. [`Server::run`] parks the caller until the cancellation
//! token fires and then shuts down:
//!
//! 1. The accept loop stops and the listener is dropped. No new connections.
//! 2. Every open connection is told to finish its current request and close.
//! 3. The server waits up to the grace period (5 s by default) for them.
//! 4. Whatever is still running after that is aborted and logged.
//!
//! Shutdown is idempotent: once the accept loop has been reaped, further calls
//! return immediately.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::Error;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::status::Status;

/// How long in-flight requests get to finish once shutdown begins.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Where a [`Server`] is in its life. Transitions only move forward.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Lifecycle {
    Starting,
    Serving,
    ShuttingDown,
    Stopped,
}

/// The HTTP server.
pub struct Server {
    grace_period: Duration,
    state: watch::Sender<Lifecycle>,
    stop: CancellationToken,
    accept_loop: Option<JoinHandle<()>>,
}

impl Server {
    pub fn new() -> Self {
        let (state, _) = watch::channel(Lifecycle::Starting);
        Self {
            grace_period: DEFAULT_GRACE_PERIOD,
            state,
            stop: CancellationToken::new(),
            accept_loop: None,
        }
    }

    /// Overrides [`DEFAULT_GRACE_PERIOD`].
    pub fn grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Current lifecycle state.
    pub fn lifecycle(&self) -> Lifecycle {
        *self.state.borrow()
    }

    /// A receiver that observes every lifecycle transition.
    pub fn subscribe(&self) -> watch::Receiver<Lifecycle> {
        self.state.subscribe()
    }

    /// Binds `addr` and starts accepting connections for `router` in the
    /// background. Returns the bound address once the server is Serving.
    ///
    /// `addr` may carry port 0 to let the OS pick one.
    pub async fn start(&mut self, addr: &str, router: Router) -> Result<SocketAddr, Error> {
        if self.lifecycle() != Lifecycle::Starting {
            return Err(Error::AlreadyStarted);
        }

        let bind_err = |source| Error::Bind { addr: addr.to_owned(), source };
        let listener = TcpListener::bind(addr).await.map_err(bind_err)?;
        let local_addr = listener.local_addr().map_err(bind_err)?;

        self.accept_loop = Some(tokio::spawn(accept_loop(
            listener,
            Arc::new(router),
            self.stop.clone(),
            self.grace_period,
        )));
        self.state.send_replace(Lifecycle::Serving);

        info!(addr = %local_addr, "cardgate listening");
        Ok(local_addr)
    }

    /// Blocks until `cancel` fires, then shuts the server down.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), Error> {
        if self.lifecycle() == Lifecycle::Starting {
            return Err(Error::NotStarted);
        }
        if self.accept_loop.is_none() {
            return Ok(());
        }

        cancel.cancelled().await;
        self.shutdown().await;
        Ok(())
    }

    /// Stops accepting, drains in-flight connections for at most the grace
    /// period, and moves to Stopped. Calling it again has no effect.
    pub async fn shutdown(&mut self) {
        let Some(accept_loop) = self.accept_loop.take() else {
            if self.lifecycle() == Lifecycle::Starting {
                self.state.send_replace(Lifecycle::Stopped);
            }
            return;
        };

        self.state.send_replace(Lifecycle::ShuttingDown);
        self.stop.cancel();

        if let Err(e) = accept_loop.await {
            error!("accept loop failed: {e}");
        }

        self.state.send_replace(Lifecycle::Stopped);
        info!("cardgate stopped");
    }
}

impl Default for Server {
    fn default() -> Self { Self::new() }
}

// A dropped server must not leave its accept loop running unattended.
impl Drop for Server {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}

// ── Accept loop ───────────────────────────────────────────────────────────────

async fn accept_loop(
    listener: TcpListener,
    router: Arc<Router>,
    stop: CancellationToken,
    grace_period: Duration,
) {
    // JoinSet tracks every spawned connection task so we can wait for them
    // all to finish, or abort them, during shutdown.
    let mut tasks = JoinSet::new();
    let drain = CancellationToken::new();

    loop {
        tokio::select! {
            // Check stop first so a cancellation immediately stops accepting,
            // even if more connections are queued.
            biased;

            () = stop.cancelled() => {
                info!(in_flight = tasks.len(), "shutdown requested, draining connections");
                break;
            }

            res = listener.accept() => {
                let (stream, peer) = match res {
                    Ok(v) => v,
                    Err(e) => {
                        error!("accept error: {e}");
                        continue;
                    }
                };
                tasks.spawn(serve_connection(stream, peer, Arc::clone(&router), drain.clone()));
            }

            // Reap finished connection tasks so the JoinSet does not grow
            // without bound on long-running servers.
            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
        }
    }

    drop(listener);
    drain.cancel();

    let drained = tokio::time::timeout(grace_period, async {
        while tasks.join_next().await.is_some() {}
    })
    .await;

    if drained.is_err() {
        warn!(
            abandoned = tasks.len(),
            grace_ms = grace_period.as_millis() as u64,
            "grace period elapsed, closing remaining connections"
        );
        tasks.shutdown().await;
    }
}

async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    router: Arc<Router>,
    drain: CancellationToken,
) {
    // `service_fn` is called once per request on the connection, not once
    // per connection.
    let svc = service_fn(move |req| {
        let router = Arc::clone(&router);
        async move { dispatch(&router, req).await }
    });

    // `auto::Builder` transparently handles both HTTP/1.1 and HTTP/2.
    let builder = ConnBuilder::new(TokioExecutor::new());
    let conn = builder.serve_connection(TokioIo::new(stream), svc);
    tokio::pin!(conn);

    let mut draining = false;
    let res = loop {
        tokio::select! {
            res = conn.as_mut() => break res,
            () = drain.cancelled(), if !draining => {
                // Lets the current request finish, then closes the connection.
                draining = true;
                conn.as_mut().graceful_shutdown();
            }
        }
    };

    if let Err(e) = res {
        debug!(%peer, "connection error: {e}");
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Converts one hyper request, routes it and converts the response back.
///
/// The error type is [`Infallible`]: every failure is answered with a status
/// code so hyper never sees an error.
async fn dispatch(
    router: &Router,
    req: hyper::Request<hyper::body::Incoming>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            debug!(method = %parts.method, path = parts.uri.path(), "failed to read body: {e}");
            return Ok(Response::status(Status::BadRequest).into_inner());
        }
    };

    let headers = parts.headers.iter()
        .map(|(name, value)| {
            (name.as_str().to_owned(), String::from_utf8_lossy(value.as_bytes()).into_owned())
        })
        .collect();

    let req = Request {
        method: parts.method.as_str().to_owned(),
        path: parts.uri.path().to_owned(),
        headers,
        body,
    };

    Ok(router.dispatch(req).await.into_inner())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Installs the SIGTERM and SIGINT handlers, then spawns a task that cancels
/// `token` on the first of them.
///
/// The handlers are registered before this returns, so a signal delivered
/// right after the call is never missed. The returned handle can be dropped;
/// the task keeps running until a signal arrives or `token` is cancelled.
pub fn cancel_on_signal(token: CancellationToken) -> Result<JoinHandle<()>, Error> {
    let signals = ShutdownSignals::install().map_err(Error::Signal)?;
    Ok(tokio::spawn(async move {
        tokio::select! {
            () = signals.recv() => {
                info!("termination signal received");
                token.cancel();
            }
            () = token.cancelled() => {}
        }
    }))
}

/// On Unix, **SIGTERM** and **SIGINT** streams. Elsewhere only Ctrl-C is
/// available, and it is listened for lazily.
struct ShutdownSignals {
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
}

impl ShutdownSignals {
    #[cfg(unix)]
    fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};
        Ok(Self {
            terminate: signal(SignalKind::terminate())?,
            interrupt: signal(SignalKind::interrupt())?,
        })
    }

    #[cfg(not(unix))]
    fn install() -> std::io::Result<Self> {
        Ok(Self {})
    }

    #[cfg(unix)]
    async fn recv(mut self) {
        tokio::select! {
            _ = self.terminate.recv() => {}
            _ = self.interrupt.recv() => {}
        }
    }

    #[cfg(not(unix))]
    async fn recv(self) {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    }
}
