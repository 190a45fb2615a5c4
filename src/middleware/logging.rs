use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tracing::info;

use crate::handler::{BoxFuture, BoxedEndpoint, Endpoint};
use crate::middleware::{CatchPanic, Middleware};
use crate::request::Request;

/// Destination for per-request access events.
///
/// Called concurrently from every in-flight request, hence `Send + Sync`.
pub trait AccessLog: Send + Sync + 'static {
    /// A request entered the logging layer at wall-clock time `at`.
    fn started(&self, method: &str, path: &str, at: SystemTime);

    /// The rest of the chain returned, whether it reached the handler or not.
    fn completed(&self, method: &str, path: &str, status: u16, elapsed: Duration);
}

/// Emits access events through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAccessLog;

impl AccessLog for TracingAccessLog {
    fn started(&self, method: &str, path: &str, at: SystemTime) {
        let started_at_ms = at.duration_since(UNIX_EPOCH).map_or(0, |d| d.as_millis() as u64);
        info!(method, path, started_at_ms, "request received");
    }

    fn completed(&self, method: &str, path: &str, status: u16, elapsed: Duration) {
        info!(method, path, status, elapsed_ms = elapsed.as_secs_f64() * 1e3, "request completed");
    }
}

/// Records a start event before the rest of the chain and a completion event,
/// with elapsed time and final status, after it.
///
/// Place it first in a [`Chain`](crate::middleware::Chain) so that requests
/// rejected further in are still logged. A panic further in is turned into a
/// 500 before it reaches this layer, so it gets a completion event too.
#[derive(Clone)]
pub struct Logging {
    log: Arc<dyn AccessLog>,
}

impl Logging {
    pub fn new(log: Arc<dyn AccessLog>) -> Self {
        Self { log }
    }
}

impl Default for Logging {
    fn default() -> Self {
        Self::new(Arc::new(TracingAccessLog))
    }
}

impl Middleware for Logging {
    fn wrap(&self, next: BoxedEndpoint) -> BoxedEndpoint {
        let next: BoxedEndpoint = Arc::new(CatchPanic::new(next));
        Arc::new(LogRequests { log: Arc::clone(&self.log), next })
    }
}

struct LogRequests {
    log: Arc<dyn AccessLog>,
    next: BoxedEndpoint,
}

impl Endpoint for LogRequests {
    fn call(&self, req: Request) -> BoxFuture {
        let log = Arc::clone(&self.log);
        let next = Arc::clone(&self.next);

        Box::pin(async move {
            let method = req.method().to_owned();
            let path = req.path().to_owned();
            let start = Instant::now();
            log.started(&method, &path, SystemTime::now());

            let res = next.call(req).await;

            log.completed(&method, &path, res.status_code(), start.elapsed());
            res
        })
    }
}
