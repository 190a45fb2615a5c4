//! Health-check endpoints.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? Failure → restart. |
//! | **Readiness** | `/readyz` | Should traffic be sent here? Failure → pulled from the load balancer. |
//!
//! Readiness follows the server [`Lifecycle`]: it flips to `503` as soon as
//! shutdown begins, so load balancers stop routing to a draining instance.

use std::sync::Arc;

use tokio::sync::watch;

use crate::handler::{BoxFuture, BoxedEndpoint, Endpoint};
use crate::request::Request;
use crate::response::Response;
use crate::server::Lifecycle;
use crate::status::Status;

/// Liveness probe handler.
///
/// Always returns `200 OK` with body `"ok"`. If the process can respond to
/// HTTP at all, it is alive.
pub async fn liveness(_req: Request) -> Response {
    Response::text("ok")
}

/// Readiness probe bound to a server's lifecycle channel
/// (see [`Server::subscribe`](crate::Server::subscribe)).
///
/// `200 ready` while Serving, `503` in every other state.
pub fn readiness(lifecycle: watch::Receiver<Lifecycle>) -> BoxedEndpoint {
    Arc::new(Readiness { lifecycle })
}

struct Readiness {
    lifecycle: watch::Receiver<Lifecycle>,
}

impl Endpoint for Readiness {
    fn call(&self, _req: Request) -> BoxFuture {
        let serving = *self.lifecycle.borrow() == Lifecycle::Serving;
        Box::pin(async move {
            if serving {
                Response::text("ready")
            } else {
                Response::status(Status::ServiceUnavailable)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn readiness_tracks_lifecycle() {
        let (tx, rx) = watch::channel(Lifecycle::Starting);
        let probe = readiness(rx);

        assert_eq!(probe.call(Request::new("GET", "/readyz")).await.status_code(), 503);

        tx.send_replace(Lifecycle::Serving);
        let res = probe.call(Request::new("GET", "/readyz")).await;
        assert_eq!(res.status_code(), 200);
        assert_eq!(res.body(), b"ready");

        tx.send_replace(Lifecycle::ShuttingDown);
        assert_eq!(probe.call(Request::new("GET", "/readyz")).await.status_code(), 503);
    }
}
