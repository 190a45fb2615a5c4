//! The production route table.

use std::sync::Arc;

use tokio::sync::watch;

use crate::card;
use crate::error::Error;
use crate::handler::Handler;
use crate::health;
use crate::method::Method;
use crate::middleware::{AccessLog, Authentication, Chain, Logging};
use crate::router::Router;
use crate::server::Lifecycle;

/// Prefix shared by every versioned API route.
pub const API_V1: &str = "/api/v1";

/// Builds the route table:
///
/// | Route | Chain |
/// |---|---|
/// | `POST /api/v1/create` | Logging → Authentication → [`card::create_card`] |
/// | `GET /healthz` | [`health::liveness`] |
/// | `GET /readyz` | [`health::readiness`] |
///
/// Logging sits outside Authentication so rejected requests are logged too.
pub fn build(access_log: Arc<dyn AccessLog>, lifecycle: watch::Receiver<Lifecycle>) -> Result<Router, Error> {
    let protected = Chain::new()
        .with(Logging::new(access_log))
        .with(Authentication::new());

    let mut router = Router::new();
    router
        .on(Method::Post, &format!("{API_V1}/create"), protected.handler(card::create_card))?
        .on(Method::Get, "/healthz", health::liveness.into_endpoint())?
        .on(Method::Get, "/readyz", health::readiness(lifecycle))?;

    Ok(router)
}
