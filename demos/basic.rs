//! Minimal relay example: a small book API with auth middleware and a group.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/books/42 -H 'x-api-key: reader'
//!   curl -X POST http://localhost:3000/books \
//!        -H 'x-api-key: editor' \
//!        -H 'content-type: application/json' \
//!        -d '{"title":"Dune"}'
//!   curl -X DELETE http://localhost:3000/books/42 -H 'x-api-key: reader'   # 403
//!   curl http://localhost:3000/books/42                                    # 401

use relay::{Config, Error, HttpError, Request, Response, Server, Status, middleware, send_json};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq)]
enum Role {
    Reader,
    Editor,
}

#[derive(Deserialize, Serialize)]
struct Book {
    title: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let mut server = Server::new(Config::traced(), middleware![authenticate]);

    server.get("/books", list_books, middleware![]);
    server.post("/books", create_book, middleware![editors_only]);

    server.group("/books/{id}", middleware![])
        .get(get_book, middleware![])
        .middleware(middleware![editors_only])
        .put(update_book, middleware![])
        .delete(delete_book, middleware![]);

    if let Err(e) = server.listen("0.0.0.0:3000").await {
        eprintln!("server error: {e}");
    }
}

// Every route runs this first. The role it finds is visible to everything after it.
fn authenticate(req: &mut Request) -> Result<(), Error> {
    let role = match req.header("x-api-key") {
        Some("reader") => Role::Reader,
        Some("editor") => Role::Editor,
        Some(_) => return Err(HttpError::unauthorized("unknown api key").into()),
        None => return Err(HttpError::unauthorized("missing x-api-key").into()),
    };
    req.extensions_mut().insert(role);
    Ok(())
}

fn editors_only(req: &mut Request) -> Result<(), Error> {
    match req.extensions().get::<Role>() {
        Some(Role::Editor) => Ok(()),
        _ => Err(HttpError::forbidden("editors only").into()),
    }
}

fn list_books(_req: &mut Request, res: &mut Response) -> Result<(), Error> {
    send_json(res, &[Book { title: "Dune".into() }, Book { title: "Hyperion".into() }])
}

fn get_book(req: &mut Request, res: &mut Response) -> Result<(), Error> {
    let id: u32 = req.param("id")
        .and_then(|id| id.parse().ok())
        .ok_or_else(|| HttpError::bad_request("id must be a number"))?;
    if id != 42 {
        return Err(HttpError::not_found(format!("no book {id}")).into());
    }
    send_json(res, &Book { title: "The Hitchhiker's Guide to the Galaxy".into() })
}

// POST /books: req.json() enforces content-type and maps bad JSON to 400.
fn create_book(req: &mut Request, res: &mut Response) -> Result<(), Error> {
    let book: Book = req.json()?;
    res.set_status(Status::Created).set_header("location", "/books/99");
    send_json(res, &book)
}

fn update_book(req: &mut Request, res: &mut Response) -> Result<(), Error> {
    let book: Book = req.json()?;
    send_json(res, &book)
}

// DELETE /books/{id} → 204 No Content
fn delete_book(_req: &mut Request, res: &mut Response) -> Result<(), Error> {
    res.set_status(Status::NoContent);
    Ok(())
}
