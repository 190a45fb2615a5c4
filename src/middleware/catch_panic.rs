use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::error;

use crate::handler::{BoxFuture, BoxedEndpoint, Endpoint};
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// The chain boundary.
///
/// Converts a panic anywhere inside `inner` into `500 Internal Server Error`
/// so one faulty request cannot take down the connection task, let alone the
/// process. The router installs it around every registered endpoint.
pub struct CatchPanic {
    inner: BoxedEndpoint,
}

impl CatchPanic {
    pub fn new(inner: BoxedEndpoint) -> Self {
        Self { inner }
    }
}

impl Endpoint for CatchPanic {
    fn call(&self, req: Request) -> BoxFuture {
        let inner = Arc::clone(&self.inner);
        let method = req.method().to_owned();
        let path = req.path().to_owned();

        // The inner call happens on first poll, so a panic raised while the
        // future is being built is caught as well.
        let fut = async move { inner.call(req).await };

        Box::pin(async move {
            match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(res) => res,
                Err(payload) => {
                    error!(%method, %path, panic = panic_message(&*payload), "handler panicked");
                    Response::status(Status::InternalServerError)
                }
            }
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Handler;

    async fn boom(_req: Request) -> Response {
        panic!("boom")
    }

    #[tokio::test]
    async fn panic_becomes_500() {
        let endpoint = CatchPanic::new(boom.into_endpoint());

        let res = endpoint.call(Request::new("POST", "/api/v1/create")).await;

        assert_eq!(res.status_code(), 500);
        assert!(res.body().is_empty());
    }

    #[tokio::test]
    async fn passes_normal_responses_through() {
        let endpoint = CatchPanic::new((|_req: Request| async { "fine" }).into_endpoint());

        let res = endpoint.call(Request::new("GET", "/")).await;

        assert_eq!(res.status_code(), 200);
        assert_eq!(res.body(), b"fine");
    }
}
