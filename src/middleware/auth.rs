use std::sync::Arc;

use tracing::debug;

use crate::handler::{BoxFuture, BoxedEndpoint, Endpoint};
use crate::middleware::Middleware;
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// Header inspected by [`Authentication::new`].
pub const AUTHORIZATION: &str = "authorization";

/// Rejects requests that carry no credential.
///
/// A request passes when the designated header is present with a non-empty
/// value; the value itself is not verified here. Anything else is answered
/// with `401 Unauthorized` and an empty body, and the rest of the chain is
/// never called.
#[derive(Clone)]
pub struct Authentication {
    header: Arc<str>,
}

impl Authentication {
    /// Inspects the `Authorization` header.
    pub fn new() -> Self {
        Self::with_header(AUTHORIZATION)
    }

    /// Inspects `name` instead of `Authorization`. Matching is case-insensitive.
    pub fn with_header(name: &str) -> Self {
        Self { header: Arc::from(name) }
    }
}

impl Default for Authentication {
    fn default() -> Self { Self::new() }
}

impl Middleware for Authentication {
    fn wrap(&self, next: BoxedEndpoint) -> BoxedEndpoint {
        Arc::new(Authenticate { header: Arc::clone(&self.header), next })
    }
}

struct Authenticate {
    header: Arc<str>,
    next: BoxedEndpoint,
}

impl Endpoint for Authenticate {
    fn call(&self, req: Request) -> BoxFuture {
        let has_token = req
            .header_value(&self.header)
            .is_some_and(|token| !token.is_empty());

        if !has_token {
            debug!(method = req.method(), path = req.path(), "missing credential, rejecting");
            return Box::pin(async { Response::status(Status::Unauthorized) });
        }

        self.next.call(req)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::handler::Handler;

    fn counting(hits: Arc<AtomicUsize>) -> BoxedEndpoint {
        (move |_req: Request| {
            let hits = Arc::clone(&hits);
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Status::Ok
            }
        })
        .into_endpoint()
    }

    #[tokio::test]
    async fn forwards_requests_with_a_token() {
        let hits = Arc::new(AtomicUsize::new(0));
        let endpoint = Authentication::new().wrap(counting(hits.clone()));

        let res = endpoint
            .call(Request::new("POST", "/").header("Authorization", "tok123"))
            .await;

        assert_eq!(res.status_code(), 200);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rejects_missing_or_empty_tokens() {
        let hits = Arc::new(AtomicUsize::new(0));
        let endpoint = Authentication::new().wrap(counting(hits.clone()));

        for req in [
            Request::new("POST", "/"),
            Request::new("POST", "/").header("authorization", ""),
            Request::new("POST", "/").header("x-api-key", "tok123"),
        ] {
            let res = endpoint.call(req).await;
            assert_eq!(res.status_code(), 401);
            assert!(res.body().is_empty());
        }
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn custom_header_name() {
        let hits = Arc::new(AtomicUsize::new(0));
        let endpoint = Authentication::with_header("X-Api-Key").wrap(counting(hits.clone()));

        let res = endpoint
            .call(Request::new("GET", "/").header("x-api-key", "k"))
            .await;

        assert_eq!(res.status_code(), 200);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
