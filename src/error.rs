//! Unified error type.

use thiserror::Error;

use crate::method::Method;

/// The error type returned by cardgate's fallible operations.
///
/// Request-level failures (401, 404, 500, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// startup failures: building the route table, binding the socket, installing
/// signal handlers and initialising telemetry.
#[derive(Debug, Error)]
pub enum Error {
    #[error("route {method} {path} is already registered")]
    DuplicateRoute { method: Method, path: String },

    #[error("invalid route `{path}`: {reason}")]
    InvalidRoute { path: String, reason: String },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server has already been started")]
    AlreadyStarted,

    #[error("server was never started")]
    NotStarted,

    #[error("failed to install signal handlers: {0}")]
    Signal(#[source] std::io::Error),

    #[error("telemetry: {0}")]
    Telemetry(String),
}
