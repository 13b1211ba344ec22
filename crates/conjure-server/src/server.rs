//! The HTTP transport.
//!
//! One tokio task per connection, hyper `http1` on top. Each request is
//! resolved against the router first; a miss is answered immediately with
//! the not-found envelope and no middleware runs. On a match the context is
//! assembled from the raw request, the middleware chain and handler run
//! through [`conjure_middleware::dispatch`], and whatever the context holds
//! afterwards becomes the response.
//!
//! # Example
//!
//! ```rust,ignore
//! use conjure_router::Router;
//! use conjure_server::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), conjure_server::ServerError> {
//!     let mut router = Router::new();
//!     // ... register routes ...
//!     let config = ServerConfig::builder().http_addr("0.0.0.0:8080").build();
//!     Server::new(config, router).run().await
//! }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::net::TcpListener;

use conjure_core::Context;
use conjure_router::{Resolution, Router};

use crate::assemble::build_context;
use crate::config::ServerConfig;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// The response body type produced by the server.
pub type ResponseBody = Full<Bytes>;

/// The full response type produced by the server.
pub type HttpResponse = Response<ResponseBody>;

/// Errors from starting the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured bind address does not parse.
    #[error("invalid bind address {addr:?}: {source}")]
    InvalidAddr {
        /// The configured address text.
        addr: String,
        /// The parse failure.
        #[source]
        source: std::net::AddrParseError,
    },

    /// Binding the listener failed.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address that could not be bound.
        addr: SocketAddr,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// The conjure HTTP server: a router plus transport settings.
pub struct Server {
    config: ServerConfig,
    router: Arc<Router>,
}

impl Server {
    /// Creates a server for `router` with `config`.
    #[must_use]
    pub fn new(config: ServerConfig, router: Router) -> Self {
        Self {
            config,
            router: Arc::new(router),
        }
    }

    /// The transport settings.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The routes being served.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Runs until SIGTERM or SIGINT, then drains connections.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals())
            .await
    }

    /// Runs until `shutdown` fires, then drains connections.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self
            .config
            .socket_addr()
            .map_err(|source| ServerError::InvalidAddr {
                addr: self.config.http_addr().to_string(),
                source,
            })?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        tracing::info!(%addr, routes = self.router.len(), "listening");

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, remote_addr)) => {
                            let server = Arc::clone(&server);
                            let token = tracker.acquire();
                            let shutdown = shutdown.clone();
                            tokio::spawn(async move {
                                if let Err(e) =
                                    server.handle_connection(stream, remote_addr, shutdown).await
                                {
                                    tracing::error!(%remote_addr, error = %e, "connection error");
                                }
                                drop(token);
                            });
                        }
                        Err(e) => tracing::error!(error = %e, "accept failed"),
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("shutdown signal received");
                    break;
                }
            }
        }

        let timeout = server.config.shutdown_timeout();
        tracing::info!(
            active = tracker.active_connections(),
            ?timeout,
            "draining connections"
        );
        tokio::select! {
            _ = tracker.drained() => tracing::info!("all connections closed"),
            _ = tokio::time::sleep(timeout) => tracing::warn!(
                active = tracker.active_connections(),
                "shutdown timeout reached"
            ),
        }
        Ok(())
    }

    async fn handle_connection(
        self: &Arc<Self>,
        stream: tokio::net::TcpStream,
        remote_addr: SocketAddr,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let io = TokioIo::new(stream);
        let server = Arc::clone(self);

        let service = service_fn(move |req: Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { server.handle_request(req).await }
        });

        let conn = http1::Builder::new().serve_connection(io, service);
        tokio::select! {
            result = conn => result,
            _ = shutdown.recv() => {
                tracing::debug!(%remote_addr, "connection closed by shutdown");
                Ok(())
            }
        }
    }

    async fn handle_request(
        self: &Arc<Self>,
        req: Request<Incoming>,
    ) -> Result<HttpResponse, Infallible> {
        let (parts, incoming) = req.into_parts();
        let method = parts.method.clone();
        let path = parts.uri.path().to_string();
        tracing::debug!(%method, %path, "request");

        // A body that cannot be read in time still gets a routed response;
        // handlers just see it empty.
        let body =
            match tokio::time::timeout(self.config.request_timeout(), incoming.collect()).await {
                Ok(Ok(collected)) => collected.to_bytes(),
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "failed to read request body");
                    Bytes::new()
                }
                Err(_) => {
                    tracing::warn!(%method, %path, "request body read timed out");
                    Bytes::new()
                }
            };

        Ok(self
            .respond(method, &path, parts.uri.query(), &parts.headers, body)
            .await)
    }

    /// Routes and dispatches one decomposed request.
    async fn respond(
        &self,
        method: Method,
        path: &str,
        raw_query: Option<&str>,
        headers: &HeaderMap,
        body: Bytes,
    ) -> HttpResponse {
        let route = match self.router.resolve(&method, path) {
            Resolution::Matched(route) => route,
            Resolution::NotFound => return not_found(method, path),
        };

        let mut ctx = build_context(
            method,
            path.to_string(),
            raw_query,
            headers,
            body,
            route.params,
            self.config.max_upload_bytes(),
        )
        .await;

        let outcome =
            conjure_middleware::dispatch(&mut ctx, &route.middlewares, &route.handler).await;
        if outcome == conjure_core::Outcome::halt() {
            // Halted without writing anything; answer for the middleware.
            if ctx.response().status == StatusCode::OK {
                ctx.set_status(StatusCode::BAD_REQUEST);
            }
            let _ = ctx.send_error_message("request rejected");
        }
        ctx.into_response()
    }
}

/// The response for a path or method with no registered handler.
fn not_found(method: Method, path: &str) -> HttpResponse {
    let mut ctx = Context::new(method, path);
    ctx.set_status(StatusCode::NOT_FOUND);
    let _ = ctx.send_error_message("page not found");
    ctx.into_response()
}
