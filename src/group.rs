//! Fluent registration of several methods on one path.
//!
//! ```rust
//! use relay::{Config, Error, Request, Response, Server, middleware};
//!
//! fn signed_in(_: &mut Request) -> Result<(), Error> { Ok(()) }
//! fn is_admin(_: &mut Request) -> Result<(), Error> { Ok(()) }
//! fn audit(_: &mut Request) -> Result<(), Error> { Ok(()) }
//! fn show(_: &mut Request, _: &mut Response) -> Result<(), Error> { Ok(()) }
//! fn update(_: &mut Request, _: &mut Response) -> Result<(), Error> { Ok(()) }
//! fn remove(_: &mut Request, _: &mut Response) -> Result<(), Error> { Ok(()) }
//!
//! let mut server = Server::new(Config::new(), middleware![]);
//! server.group("/authors/{id}", middleware![signed_in])
//!     .get(show, middleware![])                   // signed_in
//!     .middleware(middleware![is_admin])
//!     .put(update, middleware![])                 // signed_in, is_admin
//!     .delete(remove, middleware![audit]);        // signed_in, is_admin, audit
//! ```

use crate::handler::Handler;
use crate::method::Method;
use crate::middleware::BoxedMiddleware;
use crate::server::Server;

/// A path plus the middleware shared by every method registered through it.
///
/// Borrows the [`Server`] mutably, so it only exists during setup.
pub struct Group<'s> {
    path: String,
    middleware: Vec<BoxedMiddleware>,
    server: &'s mut Server,
}

impl<'s> Group<'s> {
    pub(crate) fn new(server: &'s mut Server, path: &str, middleware: Vec<BoxedMiddleware>) -> Self {
        Self { path: path.to_owned(), middleware, server }
    }

    /// Adds middleware for every method registered after this call.
    pub fn middleware(mut self, middleware: impl IntoIterator<Item = BoxedMiddleware>) -> Self {
        self.middleware.extend(middleware);
        self
    }

    pub fn get(self, handler: impl Handler, method_only: impl IntoIterator<Item = BoxedMiddleware>) -> Self {
        self.bind(Method::Get, handler, method_only)
    }

    pub fn post(self, handler: impl Handler, method_only: impl IntoIterator<Item = BoxedMiddleware>) -> Self {
        self.bind(Method::Post, handler, method_only)
    }

    pub fn put(self, handler: impl Handler, method_only: impl IntoIterator<Item = BoxedMiddleware>) -> Self {
        self.bind(Method::Put, handler, method_only)
    }

    pub fn patch(self, handler: impl Handler, method_only: impl IntoIterator<Item = BoxedMiddleware>) -> Self {
        self.bind(Method::Patch, handler, method_only)
    }

    pub fn delete(self, handler: impl Handler, method_only: impl IntoIterator<Item = BoxedMiddleware>) -> Self {
        self.bind(Method::Delete, handler, method_only)
    }

    /// Registers `group ++ method_only`. The group's own list is only read.
    fn bind(
        self,
        method: Method,
        handler: impl Handler,
        method_only: impl IntoIterator<Item = BoxedMiddleware>,
    ) -> Self {
        let chain: Vec<BoxedMiddleware> = self.middleware.iter()
            .cloned()
            .chain(method_only)
            .collect();
        self.server.route(method, &self.path, handler, chain);
        self
    }
}
