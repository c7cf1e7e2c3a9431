//! The per-route pipeline.
//!
//! A [`Queue`] is built once per (method, path) when the route is bound and is
//! read-only from then on. Each request walks it front to back:
//!
//! ```text
//! middleware[0] ─ok→ middleware[1] ─ok→ … ─ok→ controller ─ok→ response as written
//!       │err              │err                     │err
//!       └─────────────────┴───────────┬────────────┘
//!                                     ↓
//!                  classify → error logger → JSON error response
//! ```
//!
//! The walk is a plain loop over a `Vec`, so the first failure is a `return`
//! and the stack depth does not grow with the number of middleware.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::{AccessLogger, Config, ErrorLogger};
use crate::error::{Error, HttpError};
use crate::handler::BoxedHandler;
use crate::middleware::BoxedMiddleware;
use crate::request::Request;
use crate::response::{Response, send_error_json};

// ── Unit ──────────────────────────────────────────────────────────────────────

/// The unit an access-log duration is expressed in.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Unit {
    Milli,
    Micro,
    Nano,
}

impl Unit {
    /// `"m"`, `"u"` or `"n"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Milli => "m",
            Self::Micro => "u",
            Self::Nano  => "n",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Picks the coarsest unit in which `elapsed` is non-zero.
///
/// Sub-millisecond requests still report a meaningful number instead of `0`.
///
/// ```rust
/// use std::time::Duration;
/// use relay::{Unit, scale};
///
/// assert_eq!(scale(Duration::from_micros(1500)), (1, Unit::Milli));
/// assert_eq!(scale(Duration::from_nanos(1500)), (1, Unit::Micro));
/// assert_eq!(scale(Duration::from_nanos(999)), (999, Unit::Nano));
/// ```
pub fn scale(elapsed: Duration) -> (u128, Unit) {
    match (elapsed.as_millis(), elapsed.as_micros()) {
        (0, 0) => (elapsed.as_nanos(), Unit::Nano),
        (0, us) => (us, Unit::Micro),
        (ms, _) => (ms, Unit::Milli),
    }
}

// ── Queue ─────────────────────────────────────────────────────────────────────

/// An ordered middleware chain, its controller, and the loggers to report to.
pub struct Queue {
    controller: BoxedHandler,
    middleware: Vec<BoxedMiddleware>,
    error_logger: Option<ErrorLogger>,
    access_logger: Option<AccessLogger>,
}

impl Queue {
    pub fn new(controller: BoxedHandler, middleware: Vec<BoxedMiddleware>, config: &Config) -> Self {
        Self {
            controller,
            middleware,
            error_logger: config.error_logger.clone(),
            access_logger: config.access_logger.clone(),
        }
    }

    /// Runs one request through the chain and returns what should be sent.
    ///
    /// The access logger, if any, fires exactly once, after the response is
    /// final, whichever way the request ended.
    pub fn dispatch(&self, mut req: Request) -> Response {
        let start = self.access_logger.as_ref().map(|_| Instant::now());

        let res = self.run(&mut req);

        if let (Some(log), Some(start)) = (&self.access_logger, start) {
            let (duration, unit) = scale(start.elapsed());
            log(&req, duration, unit);
        }

        res
    }

    fn run(&self, req: &mut Request) -> Response {
        for (index, m) in self.middleware.iter().enumerate() {
            if let Err(err) = m.handle(req) {
                debug!(index, path = req.path(), "middleware rejected request");
                return self.fail(err);
            }
        }

        let mut res = Response::new();
        match self.controller.call(req, &mut res) {
            Ok(()) => res,
            Err(err) => self.fail(err),
        }
    }

    /// Turns a failure into the response the client sees.
    ///
    /// Whatever the controller wrote before failing is discarded. If the error
    /// response itself cannot be encoded, that is reported to the error logger
    /// and the request ends with whatever was written; there is no second
    /// attempt.
    fn fail(&self, err: Error) -> Response {
        let err = err.into_http();

        if let Some(log) = &self.error_logger {
            log(&err);
        }

        let mut res = Response::new();
        if let Err(e) = send_error_json(&mut res, &err) {
            if let Some(log) = &self.error_logger {
                log(&HttpError::internal_server_error(format!("send_error_json: {e}")));
            }
        }
        res
    }
}
