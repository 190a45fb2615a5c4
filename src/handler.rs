//! Endpoint trait and handler type erasure.
//!
//! # How handlers and middleware are stored
//!
//! The router holds endpoints of *different* concrete types in one table, so
//! every handler is erased behind the [`Endpoint`] trait object. Middleware
//! speak the same interface: each one is an `Endpoint` holding the next
//! `Endpoint`, which is what lets a chain of them stand in for a plain
//! handler.
//!
//! ```text
//! async fn create_card(req: Request) -> Response { … }   ← user writes this
//!        ↓ create_card.into_endpoint()
//! Arc::new(FnHandler(create_card))                       ← Handler blanket impl
//!        ↓ Chain::wrap
//! Arc<Logging { next: Arc<Authentication { next: … }> }>  ← decorators
//!        ↓ endpoint.call(req) at request time
//! BoxFuture<Response>                                    ← one vtable call per layer
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// A heap-allocated, type-erased future that resolves to a [`Response`].
///
/// `Pin<Box<…>>` is required because the async runtime must be able to poll
/// the future in-place — it cannot move it in memory after the first poll.
/// `Send + 'static` let tokio move the future across threads safely.
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Anything that turns a [`Request`] into a [`Response`].
///
/// Terminal handlers and middleware share this one-method interface. A
/// middleware is an `Endpoint` that owns the next `Endpoint` and decides
/// whether, and around what, to call it.
pub trait Endpoint: Send + Sync + 'static {
    fn call(&self, req: Request) -> BoxFuture;
}

/// A type-erased endpoint shared across concurrent requests.
pub type BoxedEndpoint = Arc<dyn Endpoint>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every plain route handler.
///
/// You never implement this yourself. It is automatically satisfied for any
/// `async fn` with the signature:
///
/// ```text
/// async fn name(req: Request) -> impl IntoResponse
/// ```
///
/// The trait is **sealed** (via the private `Sealed` supertrait): only the
/// blanket impl below can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    /// Erases the handler into a shareable [`BoxedEndpoint`].
    fn into_endpoint(self) -> BoxedEndpoint;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_endpoint(self) -> BoxedEndpoint {
        Arc::new(FnHandler(self))
    }
}

// ── Concrete wrapper ──────────────────────────────────────────────────────────

/// Newtype bridging a concrete handler `F` to the [`Endpoint`] trait object.
struct FnHandler<F>(F);

impl<F, Fut, R> Endpoint for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}
