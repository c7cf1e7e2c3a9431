//! Unified error type and the status-carrying [`HttpError`].
//!
//! Anything a middleware or controller returns is an [`Error`]. The pipeline
//! splits it in two:
//!
//! - [`Error::Http`] is intentional. Its status and message go to the client
//!   verbatim.
//! - Every other variant is unexpected. It becomes a `500` whose message is the
//!   error's `Display` text. Wrap internals in an [`HttpError`] yourself if they
//!   should not leak.

use std::fmt;

use serde::Serialize;

use crate::status::Status;

// ── HttpError ─────────────────────────────────────────────────────────────────

/// A client-facing failure: an HTTP status plus a human message.
///
/// Serialises to exactly `{"code": <int>, "message": "<string>"}`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct HttpError {
    code: u16,
    message: String,
}

impl HttpError {
    pub fn new(status: Status, message: impl Into<String>) -> Self {
        Self { code: status.code(), message: message.into() }
    }

    /// `400 Bad Request`
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(Status::BadRequest, message)
    }

    /// `401 Unauthorized`
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(Status::Unauthorized, message)
    }

    /// `403 Forbidden`
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(Status::Forbidden, message)
    }

    /// `404 Not Found`
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(Status::NotFound, message)
    }

    /// `405 Method Not Allowed`
    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::new(Status::MethodNotAllowed, message)
    }

    /// `500 Internal Server Error`
    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(Status::InternalServerError, message)
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn status(&self) -> Status {
        // `code` only ever comes from a `Status`.
        Status::from_code(self.code).unwrap_or(Status::InternalServerError)
    }
}

/// Log form: `"<code> <reason>: <message>"`, e.g. `404 Not Found: no such book`.
impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.code, self.status().reason(), self.message)
    }
}

impl std::error::Error for HttpError {}

// ── Error ─────────────────────────────────────────────────────────────────────

/// The error type returned by middleware, controllers, and relay's own
/// fallible operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A structured failure that already knows its status.
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid socket address `{0}`")]
    Addr(String),

    /// Anything else. Rendered as a `500` carrying this error's message.
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wraps an arbitrary error (or a plain string) as an unstructured failure.
    ///
    /// ```rust
    /// let err = relay::Error::other("boom");
    /// assert_eq!(err.into_http().message(), "boom");
    /// ```
    pub fn other(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Other(err.into())
    }

    /// Classifies the error for the client. Structured errors pass through;
    /// everything else becomes `500` with this error's message.
    pub fn into_http(self) -> HttpError {
        match self {
            Self::Http(e) => e,
            other => HttpError::internal_server_error(other.to_string()),
        }
    }
}
