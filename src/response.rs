//! Outgoing HTTP response sink and the JSON helpers.
//!
//! A controller receives `&mut Response`, sets a status and headers, and
//! writes a body. [`send_json`] and [`send_error_json`] cover the common case.

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http_body_util::Full;
use serde::Serialize;
use tracing::warn;

use crate::error::{Error, HttpError};
use crate::status::Status;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Common content-type values for use with [`Response::set_content_type`].
#[derive(Clone, Copy, Debug)]
pub enum ContentType {
    Csv,          // text/csv
    Html,         // text/html; charset=utf-8
    Json,         // application/json
    OctetStream,  // application/octet-stream  (binary / file download)
    Text,         // text/plain; charset=utf-8
    Xml,          // application/xml
}

impl ContentType {
    fn as_str(self) -> &'static str {
        match self {
            Self::Csv         => "text/csv",
            Self::Html        => "text/html; charset=utf-8",
            Self::Json        => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Text        => "text/plain; charset=utf-8",
            Self::Xml         => "application/xml",
        }
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response, buffered until the pipeline finishes.
///
/// Starts as `200 OK` with no headers and an empty body.
///
/// ```rust
/// use relay::{ContentType, Response, Status};
///
/// let mut res = Response::new();
/// res.set_status(Status::Created);
/// res.set_header("location", "/books/42");
/// res.set_content_type(ContentType::Text);
/// res.write(b"created");
/// assert_eq!(res.status(), 201);
/// ```
#[derive(Debug)]
pub struct Response {
    pub(crate) status: u16,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Vec<u8>,
}

impl Response {
    pub fn new() -> Self {
        Self { status: Status::Ok.code(), headers: Vec::new(), body: Vec::new() }
    }

    pub fn status(&self) -> u16 { self.status }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn set_status(&mut self, status: Status) -> &mut Self {
        self.status = status.code();
        self
    }

    /// Sets a header, replacing any previous value under the same name.
    pub fn set_header(&mut self, name: &str, value: &str) -> &mut Self {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn set_content_type(&mut self, content_type: ContentType) -> &mut Self {
        self.set_header("content-type", content_type.as_str())
    }

    /// Appends to the body.
    pub fn write(&mut self, bytes: &[u8]) -> &mut Self {
        self.body.extend_from_slice(bytes);
        self
    }

    /// A response holding nothing but `err`.
    pub(crate) fn from_error(err: &HttpError) -> Self {
        let mut res = Self::new();
        if let Err(e) = send_error_json(&mut res, err) {
            warn!(code = err.code(), "failed to encode error response: {e}");
        }
        res
    }

    /// Converts into the hyper-facing response.
    ///
    /// Headers whose name or value is not valid on the wire are dropped with
    /// a warning rather than failing the whole response.
    pub(crate) fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut out = http::Response::new(Full::new(Bytes::from(self.body)));
        *out.status_mut() = http::StatusCode::from_u16(self.status)
            .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);

        let headers = out.headers_mut();
        for (name, value) in self.headers {
            match (HeaderName::try_from(name.as_str()), HeaderValue::try_from(value.as_str())) {
                (Ok(n), Ok(v)) => {
                    headers.append(n, v);
                }
                _ => warn!(header = %name, "dropping invalid response header"),
            }
        }
        out
    }
}

impl Default for Response {
    fn default() -> Self { Self::new() }
}

// ── JSON helpers ──────────────────────────────────────────────────────────────

/// Writes `value` as the JSON body and sets `content-type: application/json`.
///
/// The status is left as it is (`200` unless the controller changed it).
pub fn send_json<T: Serialize + ?Sized>(res: &mut Response, value: &T) -> Result<(), Error> {
    let body = serde_json::to_vec(value)?;
    res.set_content_type(ContentType::Json).write(&body);
    Ok(())
}

/// Writes `err` as `{"code": .., "message": ..}`, with the status set to its
/// code and `content-type: application/json`.
pub fn send_error_json(res: &mut Response, err: &HttpError) -> Result<(), Error> {
    let body = serde_json::to_vec(err)?;
    res.status = err.code();
    res.set_content_type(ContentType::Json).write(&body);
    Ok(())
}
