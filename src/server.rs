//! Route registration, request handling, and the HTTP listener.
//!
//! # Setup, then serve
//!
//! Everything that shapes a route happens on `&mut Server` before serving:
//! global middleware, routes, groups. Binding a route freezes its chain right
//! then (`global ++ route`) into a [`Queue`]. [`listen`](Server::listen) and
//! [`serve`](Server::serve) take the server by value and share it behind an
//! `Arc`, so nothing can be registered once requests are flowing.
//!
//! # Graceful shutdown
//!
//! On SIGTERM or Ctrl-C the server:
//! 1. Immediately stops `listener.accept()`. No new connections are made.
//! 2. Lets every in-flight connection task run to completion.
//! 3. Returns from [`Server::listen`], which lets `main` exit cleanly.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{Error, HttpError};
use crate::group::Group;
use crate::handler::Handler;
use crate::method::Method;
use crate::middleware::BoxedMiddleware;
use crate::queue::Queue;
use crate::request::Request;
use crate::response::Response;
use crate::router::{Lookup, Router};

/// The HTTP server: configuration, global middleware, and the route table.
pub struct Server {
    config: Config,
    global: Vec<BoxedMiddleware>,
    router: Router,
}

impl Server {
    /// `global` runs first on every route bound from now on.
    pub fn new(config: Config, global: impl IntoIterator<Item = BoxedMiddleware>) -> Self {
        Self { config, global: global.into_iter().collect(), router: Router::default() }
    }

    /// Appends global middleware.
    ///
    /// Routes bound before this call keep the chain they were bound with.
    pub fn add_global_middleware(&mut self, middleware: impl IntoIterator<Item = BoxedMiddleware>) -> &mut Self {
        self.global.extend(middleware);
        self
    }

    /// Starts a [`Group`] on `path` with `middleware` shared by all its methods.
    pub fn group(&mut self, path: &str, middleware: impl IntoIterator<Item = BoxedMiddleware>) -> Group<'_> {
        Group::new(self, path, middleware.into_iter().collect())
    }

    pub fn get(&mut self, path: &str, handler: impl Handler, middleware: impl IntoIterator<Item = BoxedMiddleware>) -> &mut Self {
        self.route(Method::Get, path, handler, middleware)
    }

    pub fn post(&mut self, path: &str, handler: impl Handler, middleware: impl IntoIterator<Item = BoxedMiddleware>) -> &mut Self {
        self.route(Method::Post, path, handler, middleware)
    }

    pub fn put(&mut self, path: &str, handler: impl Handler, middleware: impl IntoIterator<Item = BoxedMiddleware>) -> &mut Self {
        self.route(Method::Put, path, handler, middleware)
    }

    pub fn patch(&mut self, path: &str, handler: impl Handler, middleware: impl IntoIterator<Item = BoxedMiddleware>) -> &mut Self {
        self.route(Method::Patch, path, handler, middleware)
    }

    pub fn delete(&mut self, path: &str, handler: impl Handler, middleware: impl IntoIterator<Item = BoxedMiddleware>) -> &mut Self {
        self.route(Method::Delete, path, handler, middleware)
    }

    /// Binds `handler` to `method` + `path` behind `global ++ middleware`.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them.
    ///
    /// # Panics
    ///
    /// Panics if `path` is malformed or already bound for `method`. Routes are
    /// fixed at startup, so this is a programming error.
    pub fn route(
        &mut self,
        method: Method,
        path: &str,
        handler: impl Handler,
        middleware: impl IntoIterator<Item = BoxedMiddleware>,
    ) -> &mut Self {
        let chain: Vec<BoxedMiddleware> = self.global.iter()
            .cloned()
            .chain(middleware)
            .collect();
        let queue = Queue::new(Arc::new(handler), chain, &self.config);

        self.router
            .insert(method, path, queue)
            .unwrap_or_else(|e| panic!("invalid route `{method} {path}`: {e}"));
        self
    }

    /// Routes one request and runs it through its queue.
    ///
    /// Unknown paths get a `404` and known paths under the wrong method a
    /// `405` with an `allow` header, both as JSON errors. `OPTIONS` on a known
    /// path with no `OPTIONS` route of its own is answered with an empty `200`
    /// carrying the same `allow` header.
    pub fn handle(&self, mut req: Request) -> Response {
        match self.router.lookup(req.method, &req.path) {
            Lookup::Found(queue, params) => {
                req.params = params;
                queue.dispatch(req)
            }
            Lookup::MethodNotAllowed(mut allowed) => {
                if !allowed.contains(&Method::Options) {
                    allowed.push(Method::Options);
                }
                let allow = allowed.iter().map(|m| m.as_str()).collect::<Vec<_>>().join(", ");

                let mut res = if req.method == Method::Options {
                    Response::new()
                } else {
                    Response::from_error(&HttpError::method_not_allowed(format!(
                        "{} is not supported on {}",
                        req.method, req.path,
                    )))
                };
                res.set_header("allow", &allow);
                res
            }
            Lookup::NotFound => {
                Response::from_error(&HttpError::not_found(format!("no route for {}", req.path)))
            }
        }
    }

    /// Binds `addr` and serves until SIGTERM or Ctrl-C.
    ///
    /// ```rust,no_run
    /// # async fn run() -> Result<(), relay::Error> {
    /// use relay::{Config, Server, middleware};
    ///
    /// let server = Server::new(Config::traced(), middleware![]);
    /// server.listen("0.0.0.0:3000").await
    /// # }
    /// ```
    pub async fn listen(self, addr: &str) -> Result<(), Error> {
        let addr: SocketAddr = addr.parse().map_err(|_| Error::Addr(addr.to_owned()))?;
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serves connections from `listener` until `shutdown` resolves, then
    /// drains in-flight connections and returns.
    pub async fn serve(self, listener: TcpListener, shutdown: impl Future<Output = ()>) -> Result<(), Error> {
        let addr = listener.local_addr()?;

        // Shared read-only by every connection task.
        let server = Arc::new(self);

        info!(%addr, "relay listening");

        let mut tasks = tokio::task::JoinSet::new();

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Check shutdown first so a signal stops accepting immediately,
                // even if more connections are queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let server = Arc::clone(&server);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on the connection.
                        let svc = service_fn(move |req| {
                            let server = Arc::clone(&server);
                            async move { serve_request(&server, req).await }
                        });

                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("relay stopped");
        Ok(())
    }
}

// ── Request conversion ────────────────────────────────────────────────────────

/// Reads one hyper request into a [`Request`] and hands it to the server.
///
/// Never fails towards hyper: every problem becomes a JSON error response.
async fn serve_request(
    server: &Server,
    req: hyper::Request<Incoming>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();

    let Ok(method) = parts.method.as_str().parse::<Method>() else {
        let err = HttpError::method_not_allowed(format!("unsupported method {}", parts.method));
        return Ok(Response::from_error(&err).into_http());
    };

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(%method, path = parts.uri.path(), "failed to read request body: {e}");
            let err = HttpError::bad_request(format!("failed to read request body: {e}"));
            return Ok(Response::from_error(&err).into_http());
        }
    };

    let headers = parts.headers.iter()
        .filter_map(|(name, value)| match value.to_str() {
            Ok(v) => Some((name.as_str().to_owned(), v.to_owned())),
            Err(_) => {
                warn!(header = %name, "skipping non-UTF-8 request header");
                None
            }
        })
        .collect();

    let req = Request::from_parts(
        method,
        parts.uri.path().to_owned(),
        parts.uri.query().map(str::to_owned),
        headers,
        body.to_vec(),
    );

    Ok(server.handle(req).into_http())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or SIGINT (Ctrl-C). Only Ctrl-C on Windows.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
