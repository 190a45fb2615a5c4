//! Middleware layer.
//!
//! Middleware intercept requests and responses and are the right place for
//! cross-cutting concerns: access logging and authentication-header
//! inspection.
//!
//! A [`Middleware`] turns the next [`Endpoint`](crate::Endpoint) into a new one. Stacking them
//! with a [`Chain`] gives onion ordering: the first middleware added is the
//! outermost, so its pre-logic runs first and its post-logic runs last.
//!
//! ```rust
//! use std::sync::Arc;
//! use cardgate::middleware::{Authentication, Chain, Logging, TracingAccessLog};
//! use cardgate::{Request, Response};
//!
//! async fn create_card(_req: Request) -> Response { Response::text("ok") }
//!
//! let endpoint = Chain::new()
//!     .with(Logging::new(Arc::new(TracingAccessLog)))
//!     .with(Authentication::new())
//!     .handler(create_card);
//! ```

mod auth;
mod catch_panic;
mod logging;

use std::sync::Arc;

use crate::handler::{BoxedEndpoint, Handler};

pub use auth::{AUTHORIZATION, Authentication};
pub use catch_panic::CatchPanic;
pub use logging::{AccessLog, Logging, TracingAccessLog};

/// A transformation from one endpoint to another.
///
/// The returned endpoint may run logic before calling `next`, after it, or
/// instead of it.
pub trait Middleware: Send + Sync + 'static {
    fn wrap(&self, next: BoxedEndpoint) -> BoxedEndpoint;
}

/// An ordered stack of middleware, composed around a terminal endpoint at
/// startup.
#[derive(Clone, Default)]
pub struct Chain {
    layers: Vec<Arc<dyn Middleware>>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `middleware` inside every layer added before it.
    pub fn with(mut self, middleware: impl Middleware) -> Self {
        self.layers.push(Arc::new(middleware));
        self
    }

    /// Composes the chain around `terminal`.
    pub fn wrap(&self, terminal: BoxedEndpoint) -> BoxedEndpoint {
        self.layers
            .iter()
            .rev()
            .fold(terminal, |next, layer| layer.wrap(next))
    }

    /// Composes the chain around a plain handler function.
    pub fn handler(&self, handler: impl Handler) -> BoxedEndpoint {
        self.wrap(handler.into_endpoint())
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::{Duration, SystemTime};

    use super::*;
    use crate::handler::{BoxFuture, Endpoint};
    use crate::{Request, Response, Status};

    type Trace = Arc<Mutex<Vec<String>>>;

    struct Mark {
        name: &'static str,
        trace: Trace,
    }

    struct MarkEndpoint {
        name: &'static str,
        trace: Trace,
        next: BoxedEndpoint,
    }

    impl Middleware for Mark {
        fn wrap(&self, next: BoxedEndpoint) -> BoxedEndpoint {
            Arc::new(MarkEndpoint { name: self.name, trace: Arc::clone(&self.trace), next })
        }
    }

    impl Endpoint for MarkEndpoint {
        fn call(&self, req: Request) -> BoxFuture {
            let name = self.name;
            let trace = Arc::clone(&self.trace);
            let next = Arc::clone(&self.next);
            Box::pin(async move {
                trace.lock().unwrap().push(format!("{name}:pre"));
                let res = next.call(req).await;
                trace.lock().unwrap().push(format!("{name}:post"));
                res
            })
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<(String, Option<u16>)>>,
    }

    impl AccessLog for Recorder {
        fn started(&self, _method: &str, path: &str, at: SystemTime) {
            assert!(at <= SystemTime::now());
            self.events.lock().unwrap().push((path.to_owned(), None));
        }

        fn completed(&self, _method: &str, path: &str, status: u16, elapsed: Duration) {
            assert!(elapsed >= Duration::ZERO);
            self.events.lock().unwrap().push((path.to_owned(), Some(status)));
        }
    }

    #[tokio::test]
    async fn chain_runs_in_onion_order() {
        let trace = Trace::default();
        let inner = Arc::clone(&trace);
        let endpoint = Chain::new()
            .with(Mark { name: "outer", trace: Arc::clone(&trace) })
            .with(Mark { name: "inner", trace: Arc::clone(&trace) })
            .handler(move |_req: Request| {
                let inner = Arc::clone(&inner);
                async move {
                    inner.lock().unwrap().push("handler".to_owned());
                    Response::text("done")
                }
            });

        let res = endpoint.call(Request::new("GET", "/")).await;

        assert_eq!(res.body(), b"done");
        assert_eq!(
            *trace.lock().unwrap(),
            ["outer:pre", "inner:pre", "handler", "inner:post", "outer:post"],
        );
    }

    #[tokio::test]
    async fn empty_chain_is_the_terminal_itself() {
        let chain = Chain::new();
        assert!(chain.is_empty());

        let res = chain.handler(|_req: Request| async { Status::NoContent })
            .call(Request::new("GET", "/"))
            .await;
        assert_eq!(res.status_code(), 204);
    }

    #[tokio::test]
    async fn logging_completes_when_authentication_short_circuits() {
        let log = Arc::new(Recorder::default());
        let endpoint = Chain::new()
            .with(Logging::new(log.clone()))
            .with(Authentication::new())
            .handler(|_req: Request| async { Response::text("secret") });

        let res = endpoint.call(Request::new("POST", "/api/v1/create")).await;

        assert_eq!(res.status_code(), 401);
        assert!(res.body().is_empty());
        assert_eq!(
            *log.events.lock().unwrap(),
            [
                ("/api/v1/create".to_owned(), None),
                ("/api/v1/create".to_owned(), Some(401)),
            ],
        );
    }

    #[tokio::test]
    async fn logging_completes_when_the_handler_panics() {
        async fn explode(_req: Request) -> Response {
            panic!("card store unavailable")
        }

        let log = Arc::new(Recorder::default());
        let endpoint = Chain::new()
            .with(Logging::new(log.clone()))
            .with(Authentication::new())
            .handler(explode);

        let res = endpoint
            .call(Request::new("POST", "/api/v1/create").header("authorization", "t"))
            .await;

        assert_eq!(res.status_code(), 500);
        assert_eq!(
            *log.events.lock().unwrap(),
            [
                ("/api/v1/create".to_owned(), None),
                ("/api/v1/create".to_owned(), Some(500)),
            ],
        );
    }
}
