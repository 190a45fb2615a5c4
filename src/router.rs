//! Request router.
//!
//! One radix tree per HTTP method, holding static paths only: a request
//! matches when its method and path equal a registered pair exactly. The table
//! is built once at startup and never written again, so dispatch needs no
//! locking.

use std::collections::HashMap;
use std::sync::Arc;

use matchit::{InsertError, Router as MatchitRouter};

use crate::error::Error;
use crate::handler::{BoxedEndpoint, Endpoint};
use crate::method::Method;
use crate::middleware::CatchPanic;
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// The application route table.
///
/// Build it during startup and hand it to [`Server::start`](crate::Server::start).
/// Every registered endpoint is wrapped in [`CatchPanic`], so a panicking
/// handler or middleware produces a 500 instead of tearing down the connection.
#[derive(Default)]
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedEndpoint>>,
    len: usize,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an endpoint for a method + path pair.
    ///
    /// Fails with [`Error::DuplicateRoute`] if the pair is already taken, in
    /// which case the table is left untouched, and with
    /// [`Error::InvalidRoute`] if `path` is not a static absolute path.
    ///
    /// ```rust
    /// # use cardgate::{Method, Request, Response, Router, Handler};
    /// # async fn create_card(_: Request) -> Response { Response::text("") }
    /// let mut router = Router::new();
    /// router.on(Method::Post, "/api/v1/create", create_card.into_endpoint())?;
    /// assert!(router.on(Method::Post, "/api/v1/create", create_card.into_endpoint()).is_err());
    /// # Ok::<(), cardgate::Error>(())
    /// ```
    pub fn on(&mut self, method: Method, path: &str, endpoint: BoxedEndpoint) -> Result<&mut Self, Error> {
        validate_path(path)?;

        let tree = self.routes.entry(method).or_default();
        if tree.at(path).is_ok() {
            return Err(Error::DuplicateRoute { method, path: path.to_owned() });
        }

        let endpoint: BoxedEndpoint = Arc::new(CatchPanic::new(endpoint));
        tree.insert(path, endpoint).map_err(|e| match e {
            InsertError::Conflict { .. } => Error::DuplicateRoute { method, path: path.to_owned() },
            other => Error::InvalidRoute { path: path.to_owned(), reason: other.to_string() },
        })?;

        self.len += 1;
        Ok(self)
    }

    /// Whether `method` + `path` has a registered endpoint.
    pub fn contains(&self, method: Method, path: &str) -> bool {
        self.lookup(method, path).is_some()
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Routes one request and produces one response.
    ///
    /// A miss, including any non-standard method, is answered with
    /// `404 Not Found` without running any middleware.
    pub async fn dispatch(&self, req: Request) -> Response {
        let endpoint = req
            .method()
            .parse::<Method>()
            .ok()
            .and_then(|method| self.lookup(method, req.path()));

        match endpoint {
            Some(endpoint) => endpoint.call(req).await,
            None => Response::status(Status::NotFound),
        }
    }

    fn lookup(&self, method: Method, path: &str) -> Option<BoxedEndpoint> {
        let tree = self.routes.get(&method)?;
        let matched = tree.at(path).ok()?;
        Some(Arc::clone(matched.value))
    }
}

fn validate_path(path: &str) -> Result<(), Error> {
    let reason = if !path.starts_with('/') {
        "path must start with `/`"
    } else if path.contains(['{', '}']) {
        "path parameters and wildcards are not supported"
    } else {
        return Ok(());
    };
    Err(Error::InvalidRoute { path: path.to_owned(), reason: reason.to_owned() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Handler;

    async fn ok(_req: Request) -> Response {
        Response::text("ok")
    }

    #[test]
    fn duplicate_leaves_table_unchanged() {
        let mut router = Router::new();
        router.on(Method::Post, "/api/v1/create", ok.into_endpoint()).unwrap();

        let err = router
            .on(Method::Post, "/api/v1/create", ok.into_endpoint())
            .err()
            .unwrap();

        assert!(matches!(err, Error::DuplicateRoute { method: Method::Post, .. }));
        assert_eq!(router.len(), 1);
        assert!(router.contains(Method::Post, "/api/v1/create"));
    }

    #[test]
    fn same_path_different_method_is_distinct() {
        let mut router = Router::new();
        router
            .on(Method::Post, "/api/v1/create", ok.into_endpoint()).unwrap()
            .on(Method::Get, "/api/v1/create", ok.into_endpoint()).unwrap();

        assert_eq!(router.len(), 2);
    }

    #[test]
    fn rejects_dynamic_and_relative_paths() {
        let mut router = Router::new();
        for path in ["/users/{id}", "/files/{*rest}", "api/v1/create", ""] {
            let err = router.on(Method::Get, path, ok.into_endpoint()).err().unwrap();
            assert!(matches!(err, Error::InvalidRoute { .. }), "{path}");
        }
        assert!(router.is_empty());
    }

    #[tokio::test]
    async fn lookup_is_exact() {
        let mut router = Router::new();
        router.on(Method::Get, "/healthz", ok.into_endpoint()).unwrap();

        assert_eq!(router.dispatch(Request::new("GET", "/healthz")).await.status_code(), 200);
        assert_eq!(router.dispatch(Request::new("GET", "/healthz/")).await.status_code(), 404);
        assert_eq!(router.dispatch(Request::new("GET", "/health")).await.status_code(), 404);
        assert_eq!(router.dispatch(Request::new("BREW", "/healthz")).await.status_code(), 404);
    }
}
