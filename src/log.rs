//! Ready-made loggers backed by `tracing`.
//!
//! Install a subscriber (e.g. `tracing_subscriber::fmt::init()`) and pass
//! [`Config::traced`](crate::Config::traced) to the server:
//!
//! ```text
//! INFO relay::log: GET /books/42?edition=2 312us method=GET path=/books/42
//! ERROR relay::log: 404 Not Found: no such book code=404
//! ```

use std::sync::Arc;

use tracing::{error, info};

use crate::config::{AccessLogger, ErrorLogger};
use crate::error::HttpError;
use crate::queue::Unit;
use crate::request::Request;

/// Logs each failed request at `error` level.
pub fn error_logger() -> ErrorLogger {
    Arc::new(|err: &HttpError| error!(code = err.code(), "{err}"))
}

/// Logs each request as `"METHOD URI DURATION"` at `info` level, where the URI
/// is the path plus the query string when there is one.
pub fn access_logger() -> AccessLogger {
    Arc::new(|req: &Request, duration: u128, unit: Unit| {
        let query = req.query().map(|q| format!("?{q}")).unwrap_or_default();
        info!(
            method = %req.method(),
            path = req.path(),
            "{} {}{query} {duration}{unit}s",
            req.method(),
            req.path(),
        );
    })
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Mutex;

    use super::*;
    use crate::config::Config;
    use crate::error::Error;
    use crate::method::Method;
    use crate::middleware;
    use crate::response::Response;
    use crate::server::Server;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Buffer {
        fn lines(&self) -> Vec<String> {
            String::from_utf8(self.0.lock().unwrap().clone())
                .unwrap()
                .lines()
                .map(str::to_owned)
                .collect()
        }
    }

    /// Runs `f` with a plain-text subscriber that writes into the returned buffer.
    fn captured(f: impl FnOnce()) -> Buffer {
        let buffer = Buffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer({
                let buffer = buffer.clone();
                move || buffer.clone()
            })
            .with_ansi(false)
            .without_time()
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        buffer
    }

    /// The message part of a line: whatever follows `relay::log: `.
    fn message(line: &str) -> &str {
        line.split_once("relay::log: ").map(|(_, m)| m).unwrap_or("")
    }

    /// `<digits><m|u|n>s`
    fn is_duration(token: &str) -> bool {
        let Some(rest) = token.strip_suffix('s') else { return false };
        let Some(digits) = rest.strip_suffix(['m', 'u', 'n']) else { return false };
        !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
    }

    fn access_line(buffer: &Buffer, method: &str, uri: &str) -> bool {
        buffer.lines().iter().any(|line| {
            let words: Vec<&str> = message(line).split_whitespace().collect();
            words.len() >= 3 && words[0] == method && words[1] == uri && is_duration(words[2])
        })
    }

    #[test]
    fn duration_token_shape() {
        assert!(is_duration("12us"));
        assert!(is_duration("3ms"));
        assert!(is_duration("999ns"));
        assert!(!is_duration("us"));
        assert!(!is_duration("12s"));
        assert!(!is_duration("1.5ms"));
    }

    #[test]
    fn access_line_is_method_uri_duration() {
        let log = access_logger();
        let buffer = captured(|| {
            log(&Request::new(Method::Get, "/books/42"), 312, Unit::Micro);
        });

        let lines = buffer.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("INFO"));
        assert_eq!(message(&lines[0]).split_whitespace().take(3).collect::<Vec<_>>(), ["GET", "/books/42", "312us"]);
    }

    #[test]
    fn access_line_carries_the_query_string() {
        let mut server = Server::new(Config::traced(), middleware![]);
        server.get(
            "/books/{id}",
            |_req: &mut Request, _res: &mut Response| -> Result<(), Error> { Ok(()) },
            middleware![],
        );

        let buffer = captured(|| {
            let mut req = Request::new(Method::Get, "/books/42");
            req.query = Some("edition=2".to_owned());
            server.handle(req);
            server.handle(Request::new(Method::Get, "/books/7"));
        });

        assert!(access_line(&buffer, "GET", "/books/42?edition=2"), "{:?}", buffer.lines());
        assert!(access_line(&buffer, "GET", "/books/7"), "{:?}", buffer.lines());
    }

    #[test]
    fn error_line_describes_the_error() {
        let log = error_logger();
        let buffer = captured(|| log(&HttpError::not_found("no such book")));

        let lines = buffer.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("ERROR"));
        assert!(message(&lines[0]).starts_with("404 Not Found: no such book"));
        assert!(lines[0].contains("code=404"));
    }

    #[test]
    fn traced_config_logs_failures_and_every_request() {
        let mut server = Server::new(Config::traced(), middleware![]);
        server.post(
            "/books",
            |_req: &mut Request, _res: &mut Response| -> Result<(), Error> {
                Err(HttpError::forbidden("editors only").into())
            },
            middleware![],
        );

        let buffer = captured(|| {
            server.handle(Request::new(Method::Post, "/books"));
        });

        let lines = buffer.lines();
        assert!(lines.iter().any(|l| message(l).starts_with("403 Forbidden: editors only")), "{lines:?}");
        assert!(access_line(&buffer, "POST", "/books"), "{lines:?}");
    }
}
