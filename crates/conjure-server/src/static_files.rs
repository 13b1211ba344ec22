//! Static file handlers.
//!
//! [`DirFiles`] serves a directory under a route mount: the request-path
//! remainder past the mount is appended to the disk prefix and read from
//! disk. [`FileRoute`] pins a single route to a single file. Both infer the
//! content type from the file extension and answer misses with the
//! not-found envelope, so a handler response is always written.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use conjure_core::{BoxFuture, Context, Handler, Outcome};
use http::StatusCode;

/// Serves files under a disk prefix for a route mount.
pub struct DirFiles {
    mount: String,
    root: PathBuf,
}

impl DirFiles {
    /// Creates a handler serving `root` for requests under `mount`.
    ///
    /// `mount` must be the same path the handler is registered at; the
    /// remainder of a request path past it selects the file inside `root`.
    #[must_use]
    pub fn new(mount: impl Into<String>, root: impl Into<PathBuf>) -> Arc<dyn Handler> {
        Arc::new(Self {
            mount: mount.into().trim_end_matches('/').to_string(),
            root: root.into(),
        })
    }

    /// Maps a request path to a disk path, refusing traversal outside the
    /// root.
    fn resolve(&self, request_path: &str) -> Option<PathBuf> {
        let remainder = request_path
            .strip_prefix(&self.mount)
            .unwrap_or(request_path)
            .trim_start_matches('/');

        for component in Path::new(remainder).components() {
            if matches!(component, Component::ParentDir) {
                return None;
            }
        }
        Some(self.root.join(remainder))
    }
}

impl Handler for DirFiles {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Outcome> {
        match self.resolve(ctx.path()) {
            Some(path) => {
                if let Err(e) = ctx.send_file(&path) {
                    tracing::debug!(path = %path.display(), error = %e, "static file miss");
                }
            }
            None => {
                tracing::warn!(path = ctx.path(), "refused traversal in static path");
                ctx.set_status(StatusCode::FORBIDDEN);
                ctx.send_error_message("forbidden");
            }
        }
        Box::pin(async { Outcome::Continue })
    }
}

/// Serves one fixed file for one route.
pub struct FileRoute {
    path: PathBuf,
}

impl FileRoute {
    /// Creates a handler that always serves the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Arc<dyn Handler> {
        Arc::new(Self { path: path.into() })
    }
}

impl Handler for FileRoute {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Outcome> {
        if let Err(e) = ctx.send_file(&self.path) {
            tracing::debug!(path = %self.path.display(), error = %e, "file route miss");
        }
        Box::pin(async { Outcome::Continue })
    }
}
