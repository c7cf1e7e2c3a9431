//! Controller trait and type erasure.
//!
//! # How controllers are stored
//!
//! The router holds one [`Queue`](crate::Queue) per route, each with a
//! controller of a different concrete type. We erase them behind
//! `Arc<dyn Handler>` so every queue stores the same thing:
//!
//! ```text
//! fn list_books(req: &mut Request, res: &mut Response) -> Result<(), Error>   ← user writes this
//!        ↓ server.get("/books", list_books, middleware![])
//! Arc::new(list_books)                           ← BoxedHandler
//!        ↓ at request time
//! handler.call(&mut req, &mut res)               ← one vtable dispatch
//! ```
//!
//! Controllers are synchronous. A request runs through its queue start to
//! finish on the connection's task, with no suspension point in between.

use std::sync::Arc;

use crate::error::Error;
use crate::request::Request;
use crate::response::Response;

/// The terminal step of a route: writes the response or fails.
///
/// Implemented for every `Fn(&mut Request, &mut Response) -> Result<(), Error>`,
/// so plain `fn` items work as controllers. Implement it on a struct when the
/// controller needs configuration of its own.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, req: &mut Request, res: &mut Response) -> Result<(), Error>;
}

/// A type-erased controller shared by every request on its route.
pub type BoxedHandler = Arc<dyn Handler>;

impl<F> Handler for F
where
    F: Fn(&mut Request, &mut Response) -> Result<(), Error> + Send + Sync + 'static,
{
    fn call(&self, req: &mut Request, res: &mut Response) -> Result<(), Error> {
        self(req, res)
    }
}
