//! # relay
//!
//! A minimal HTTP request pipeline. Match a route, run its middleware in order,
//! run its controller, and turn any failure into a JSON error. Nothing more.
//!
//! ## The contract
//!
//! Every route is a [`Queue`]:
//!
//! - **Middleware** run first, in registration order: global ones, then the
//!   group's, then the route's own. Each returns `Ok(())` to continue or an
//!   [`Error`] to stop. A stopped request never reaches the controller.
//! - **The controller** writes the [`Response`] or returns an [`Error`].
//! - **Errors** become `{"code": .., "message": ..}` with the matching status.
//!   An [`HttpError`] keeps its status; anything else is a `500`.
//! - **Loggers** from [`Config`] see every classified error and every request's
//!   duration.
//!
//! The chain is fixed when a route is bound. Global middleware added later
//! only reaches routes bound later.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use relay::{Config, Error, HttpError, Request, Response, Server, middleware, send_json};
//!
//! #[derive(Clone)]
//! struct Reader(String);
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let mut server = Server::new(Config::traced(), middleware![authenticate]);
//!
//!     server.get("/books/{id}", get_book, middleware![]);
//!     server.group("/books", middleware![])
//!         .get(list_books, middleware![])
//!         .post(create_book, middleware![admin_only]);
//!
//!     server.listen("0.0.0.0:3000").await
//! }
//!
//! fn authenticate(req: &mut Request) -> Result<(), Error> {
//!     let name = req.header("x-reader")
//!         .ok_or_else(|| HttpError::unauthorized("who are you?"))?
//!         .to_owned();
//!     req.extensions_mut().insert(Reader(name));
//!     Ok(())
//! }
//!
//! fn admin_only(req: &mut Request) -> Result<(), Error> {
//!     match req.extensions().get::<Reader>() {
//!         Some(Reader(name)) if name == "admin" => Ok(()),
//!         _ => Err(HttpError::forbidden("admins only").into()),
//!     }
//! }
//!
//! fn get_book(req: &mut Request, res: &mut Response) -> Result<(), Error> {
//!     let id = req.param("id").unwrap_or("unknown");
//!     send_json(res, &serde_json::json!({ "id": id }))
//! }
//!
//! fn list_books(_req: &mut Request, res: &mut Response) -> Result<(), Error> {
//!     send_json(res, &["Dune", "Hyperion"])
//! }
//!
//! fn create_book(req: &mut Request, res: &mut Response) -> Result<(), Error> {
//!     let book: serde_json::Value = req.json()?;
//!     send_json(res, &book)
//! }
//! ```

mod config;
mod error;
mod group;
mod handler;
mod method;
mod queue;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod log;
pub mod middleware;

pub use config::{AccessLogger, Config, ErrorLogger};
pub use error::{Error, HttpError};
pub use group::Group;
pub use handler::{BoxedHandler, Handler};
pub use method::Method;
pub use middleware::{BoxedMiddleware, Middleware};
pub use queue::{Queue, Unit, scale};
pub use request::Request;
pub use response::{ContentType, Response, send_error_json, send_json};
pub use server::Server;
pub use status::Status;
