//! Middleware layer.
//!
//! A middleware is a pre-check that runs after route matching and before the
//! controller. It either lets the request through (`Ok(())`) or aborts it with
//! an error, which the [`Queue`](crate::Queue) turns into a JSON error
//! response. Nothing after a failing middleware runs.
//!
//! Middleware may leave values in [`Request::extensions_mut`] for everything
//! downstream:
//!
//! ```rust
//! use relay::{Error, HttpError, Request};
//!
//! #[derive(Clone)]
//! struct User(String);
//!
//! fn authenticate(req: &mut Request) -> Result<(), Error> {
//!     let token = req.header("authorization")
//!         .ok_or_else(|| HttpError::unauthorized("missing credentials"))?;
//!     let user = User(token.trim_start_matches("Bearer ").to_owned());
//!     req.extensions_mut().insert(user);
//!     Ok(())
//! }
//! ```
//!
//! Order is significant: a route runs its global middleware, then its group
//! middleware, then its own, each in registration order.

use std::sync::Arc;

use crate::error::Error;
use crate::request::Request;

pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, req: &mut Request) -> Result<(), Error>;
}

/// A type-erased middleware, cheap to share between routes.
pub type BoxedMiddleware = Arc<dyn Middleware>;

impl<F> Middleware for F
where
    F: Fn(&mut Request) -> Result<(), Error> + Send + Sync + 'static,
{
    fn handle(&self, req: &mut Request) -> Result<(), Error> {
        self(req)
    }
}

/// Erases a middleware. Prefer the [`middleware!`](crate::middleware!) macro
/// when building a list.
pub fn boxed(m: impl Middleware) -> BoxedMiddleware {
    Arc::new(m)
}

/// Builds a `Vec<BoxedMiddleware>` from middleware of different types.
///
/// ```rust
/// use relay::{Error, Request, middleware};
///
/// fn a(_: &mut Request) -> Result<(), Error> { Ok(()) }
/// fn b(_: &mut Request) -> Result<(), Error> { Ok(()) }
///
/// let chain = middleware![a, b];
/// assert_eq!(chain.len(), 2);
/// let none = middleware![];
/// assert!(none.is_empty());
/// ```
#[macro_export]
macro_rules! middleware {
    () => {
        ::std::vec::Vec::<$crate::middleware::BoxedMiddleware>::new()
    };
    ($($m:expr),+ $(,)?) => {
        ::std::vec![$($crate::middleware::boxed($m)),+]
    };
}
