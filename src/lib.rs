//! # cardgate
//!
//! A minimal HTTP host for the card API. It accepts connections, routes each
//! request through a chain of cross-cutting middleware to a terminal handler,
//! and shuts down cleanly on SIGINT / SIGTERM.
//!
//! What lives here:
//!
//! - **Middleware chains** — [`middleware::Chain`] composes
//!   [`middleware::Middleware`] around a handler in onion order; panics are
//!   caught at the chain boundary and answered with 500.
//! - **Exact routing** — one static path per `(method, path)` key, 404 on miss.
//! - **Lifecycle** — [`Server`] binds, serves in the background and drains
//!   in-flight requests for a bounded grace period on cancellation.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cardgate::middleware::{Authentication, Chain, Logging, TracingAccessLog};
//! use cardgate::{Method, Request, Response, Router, Server, cancel_on_signal};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), cardgate::Error> {
//!     let chain = Chain::new()
//!         .with(Logging::new(Arc::new(TracingAccessLog)))
//!         .with(Authentication::new());
//!
//!     let mut router = Router::new();
//!     router.on(Method::Post, "/api/v1/create", chain.handler(create))?;
//!
//!     let cancel = CancellationToken::new();
//!     cancel_on_signal(cancel.clone())?;
//!
//!     let mut server = Server::new();
//!     server.start("0.0.0.0:8080", router).await?;
//!     server.run(cancel).await
//! }
//!
//! async fn create(req: Request) -> Response {
//!     Response::json(req.into_body().to_vec())
//! }
//! ```

mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod card;
pub mod config;
pub mod health;
pub mod middleware;
pub mod routes;
pub mod telemetry;

pub use error::Error;
pub use handler::{BoxFuture, BoxedEndpoint, Endpoint, Handler};
pub use method::Method;
pub use request::Request;
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::{DEFAULT_GRACE_PERIOD, Lifecycle, Server, cancel_on_signal};
pub use status::Status;
