//! HTTP status codes as a typed enum.
//!
//! Use [`Status`] anywhere a status code is accepted — `Response::status()`,
//! `Response::builder().status()`, or as a bare handler return value.
//!
//! ```rust
//! use cardgate::{Response, Status};
//!
//! Response::status(Status::Unauthorized);
//!
//! async fn delete_card(_req: cardgate::Request) -> Status {
//!     Status::NoContent
//! }
//! ```

/// The status codes this host produces.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    // ── 2xx Success ───────────────────────────────────────────────────────────
    Ok,                   // 200
    Created,              // 201
    NoContent,            // 204

    // ── 4xx Client errors ─────────────────────────────────────────────────────
    BadRequest,           // 400
    Unauthorized,         // 401
    NotFound,             // 404
    UnprocessableContent, // 422

    // ── 5xx Server errors ─────────────────────────────────────────────────────
    InternalServerError,  // 500
    ServiceUnavailable,   // 503
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Self::Ok                   => 200,
            Self::Created              => 201,
            Self::NoContent            => 204,
            Self::BadRequest           => 400,
            Self::Unauthorized         => 401,
            Self::NotFound             => 404,
            Self::UnprocessableContent => 422,
            Self::InternalServerError  => 500,
            Self::ServiceUnavailable   => 503,
        }
    }
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 {
        s.code()
    }
}
