//! Server configuration: the optional error and access loggers.
//!
//! Both default to unset, which makes them no-ops. The server copies them into
//! every [`Queue`](crate::Queue) it builds.

use std::fmt;
use std::sync::Arc;

use crate::error::HttpError;
use crate::log;
use crate::queue::Unit;
use crate::request::Request;

/// Called with the classified error every time a request fails.
pub type ErrorLogger = Arc<dyn Fn(&HttpError) + Send + Sync>;

/// Called once per request with its duration, expressed in `unit`.
pub type AccessLogger = Arc<dyn Fn(&Request, u128, Unit) + Send + Sync>;

#[derive(Clone, Default)]
pub struct Config {
    pub(crate) error_logger: Option<ErrorLogger>,
    pub(crate) access_logger: Option<AccessLogger>,
}

impl Config {
    /// No loggers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Both loggers, emitting through `tracing`. See [`log`](crate::log).
    pub fn traced() -> Self {
        Self {
            error_logger: Some(log::error_logger()),
            access_logger: Some(log::access_logger()),
        }
    }

    pub fn error_logger(mut self, f: impl Fn(&HttpError) + Send + Sync + 'static) -> Self {
        self.error_logger = Some(Arc::new(f));
        self
    }

    pub fn access_logger(mut self, f: impl Fn(&Request, u128, Unit) + Send + Sync + 'static) -> Self {
        self.access_logger = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("error_logger", &self.error_logger.is_some())
            .field("access_logger", &self.access_logger.is_some())
            .finish()
    }
}
