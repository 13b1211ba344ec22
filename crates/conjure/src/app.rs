//! The application facade.

use std::path::PathBuf;
use std::sync::Arc;

use conjure_core::{Handler, Middleware};
use conjure_router::{RouteError, Router, Scope};
use conjure_server::{
    DirFiles, FileRoute, Server, ServerConfig, ServerError, ShutdownSignal,
    DEFAULT_HTTP_ADDR, DEFAULT_MAX_UPLOAD_BYTES,
};

/// An application: a router plus the transport settings to serve it.
///
/// # Example
///
/// ```rust,no_run
/// use conjure::prelude::*;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut app = App::new();
///     app.get("/hello/:name", handler_fn(|ctx| {
///         let name = ctx.params().parse_str("name");
///         ctx.send_string(format!("hello, {name}"));
///         Box::pin(async { Outcome::Continue })
///     }))?;
///     app.http_addr("127.0.0.1:8080");
///     app.serve().await?;
///     Ok(())
/// }
/// ```
pub struct App {
    router: Router,
    http_addr: String,
    max_upload_bytes: usize,
}

impl App {
    /// Creates an app with no routes and default transport settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    /// Registers a GET route.
    pub fn get(&mut self, path: &str, handler: Arc<dyn Handler>) -> Result<(), RouteError> {
        self.router.get(path, handler)
    }

    /// Registers a POST route.
    pub fn post(&mut self, path: &str, handler: Arc<dyn Handler>) -> Result<(), RouteError> {
        self.router.post(path, handler)
    }

    /// Registers a PUT route.
    pub fn put(&mut self, path: &str, handler: Arc<dyn Handler>) -> Result<(), RouteError> {
        self.router.put(path, handler)
    }

    /// Registers a DELETE route.
    pub fn delete(&mut self, path: &str, handler: Arc<dyn Handler>) -> Result<(), RouteError> {
        self.router.delete(path, handler)
    }

    /// Serves a single file at a GET route.
    pub fn file(&mut self, path: &str, disk_path: impl Into<PathBuf>) -> Result<(), RouteError> {
        self.router.get(path, FileRoute::new(disk_path))
    }

    /// Serves a directory under `mount`; the request path past the mount
    /// selects the file inside `dir`.
    pub fn serve_dir(&mut self, mount: &str, dir: impl Into<PathBuf>) -> Result<(), RouteError> {
        self.router.register_static(mount, DirFiles::new(mount, dir))
    }

    /// Attaches middleware at `path`, covering every route at or below it.
    pub fn attach(
        &mut self,
        path: &str,
        middlewares: Vec<Arc<dyn Middleware>>,
    ) -> Result<(), RouteError> {
        self.router.attach(path, middlewares)
    }

    /// Opens a route group under `path` with its own middleware.
    pub fn scope(
        &mut self,
        path: &str,
        middlewares: Vec<Arc<dyn Middleware>>,
    ) -> Result<Scope<'_>, RouteError> {
        self.router.scope(path, middlewares)
    }

    /// Sets the bind address.
    pub fn http_addr(&mut self, addr: impl Into<String>) -> &mut Self {
        self.http_addr = addr.into();
        self
    }

    /// Sets the multipart upload size cap.
    pub fn max_upload_bytes(&mut self, bytes: usize) -> &mut Self {
        self.max_upload_bytes = bytes;
        self
    }

    /// The routes registered so far.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Consumes the app, yielding the router for embedding elsewhere.
    #[must_use]
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Serves until SIGTERM or SIGINT.
    pub async fn serve(self) -> Result<(), ServerError> {
        self.into_server().run().await
    }

    /// Serves until `shutdown` fires.
    pub async fn serve_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        self.into_server().run_with_shutdown(shutdown).await
    }

    fn into_server(self) -> Server {
        let config = ServerConfig::builder()
            .http_addr(self.http_addr)
            .max_upload_bytes(self.max_upload_bytes)
            .build();
        Server::new(config, self.router)
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
