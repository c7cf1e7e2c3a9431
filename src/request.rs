//! Incoming HTTP request type.
//!
//! A [`Request`] is also the per-request scope: middleware stash derived values
//! (an authenticated user, a decoded payload) in its [`Extensions`] and every
//! later middleware and the controller read them back by type.

use std::collections::HashMap;

use http::Extensions;
use serde::de::DeserializeOwned;
use serde_json::error::Category;

use crate::error::{Error, HttpError};
use crate::method::Method;

/// An incoming HTTP request with its body fully read.
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Option<String>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Vec<u8>,
    pub(crate) params: HashMap<String, String>,
    extensions: Extensions,
}

impl Request {
    /// A bodiless request. Mostly useful for driving a
    /// [`Server`](crate::Server) or [`Queue`](crate::Queue) without a socket.
    ///
    /// ```rust
    /// use relay::{Method, Request};
    ///
    /// let req = Request::new(Method::Post, "/books")
    ///     .with_header("content-type", "application/json")
    ///     .with_body(r#"{"title":"Dune"}"#);
    /// assert_eq!(req.header("Content-Type"), Some("application/json"));
    /// ```
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            headers: Vec::new(),
            body: Vec::new(),
            params: HashMap::new(),
            extensions: Extensions::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Binds a path parameter as the router would after a match.
    pub fn with_param(mut self, name: &str, value: &str) -> Self {
        self.params.insert(name.to_owned(), value.to_owned());
        self
    }

    pub(crate) fn from_parts(
        method: Method,
        path: String,
        query: Option<String>,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    ) -> Self {
        Self { query, headers, body, ..Self::new(method, path) }
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn query(&self) -> Option<&str> { self.query.as_deref() }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Values attached by earlier middleware.
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Returns the body if the request's media type is one of `accept`.
    ///
    /// An empty `accept` list allows any content type. Parameters after `;`
    /// (e.g. `charset`) are ignored when comparing. A mismatch is a
    /// `400 Bad Request`.
    pub fn read_body(&self, accept: &[&str]) -> Result<&[u8], Error> {
        if !accept.is_empty() {
            let media_type = self.header("content-type")
                .and_then(|ct| ct.split(';').next())
                .map(str::trim)
                .unwrap_or("");

            if !accept.iter().any(|a| *a == media_type) {
                return Err(HttpError::bad_request(format!(
                    "Bad Content-Type: {media_type}. Accept: {}",
                    accept.join(", "),
                ))
                .into());
            }
        }

        Ok(&self.body)
    }

    /// Decodes an `application/json` body into `T`.
    ///
    /// Wrong content type, malformed JSON, and JSON of the wrong shape are all
    /// `400 Bad Request`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let body = self.read_body(&["application/json"])?;

        serde_json::from_slice(body).map_err(|e| match e.classify() {
            Category::Syntax | Category::Eof | Category::Data => {
                HttpError::bad_request(e.to_string()).into()
            }
            Category::Io => Error::Json(e),
        })
    }
}
