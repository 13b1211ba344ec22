//! The public routing surface.
//!
//! [`Router`] owns the trie root and exposes registration and resolution.
//! [`Scope`] is a borrowed view rooted at a path prefix, so route groups can
//! share a prefix and a middleware stack without repeating either.

use std::sync::Arc;

use conjure_core::{Handler, Middleware, Values};
use http::Method;

use crate::error::RouteError;
use crate::node::Node;

/// A successfully resolved route.
pub struct RouteMatch {
    /// The handler installed for the request method.
    pub handler: Arc<dyn Handler>,
    /// Middleware collected root-to-leaf along the matched path.
    pub middlewares: Vec<Arc<dyn Middleware>>,
    /// Parameter bindings captured from the request path.
    pub params: Values,
}

/// The result of matching a request against the routing trie.
pub enum Resolution {
    /// A handler exists for this method and path.
    Matched(RouteMatch),
    /// No node matched, or the matched node has no handler for the method.
    NotFound,
}

impl Resolution {
    /// Returns `true` when a handler was found.
    #[must_use]
    pub fn is_matched(&self) -> bool {
        matches!(self, Resolution::Matched(_))
    }
}

/// An HTTP request router backed by a path-segment trie.
///
/// Routes are registered per method against paths whose segments are either
/// literals or `:name` parameters. Static mounts freeze a subtree so the
/// unmatched remainder of a request path reaches the mounted handler intact.
///
/// Registration takes `&mut self` and happens before serving; [`Router::resolve`]
/// takes `&self` and is lock-free, so the finished router can be shared behind
/// an `Arc` for concurrent resolution.
///
/// # Example
///
/// ```rust
/// use conjure_core::{handler_fn, Outcome};
/// use conjure_router::Router;
///
/// let mut router = Router::new();
/// router
///     .get("/users/:id", handler_fn(|ctx| {
///         let id = ctx.params().parse_str("id");
///         ctx.send_string(&id);
///         Box::pin(async { Outcome::Continue })
///     }))
///     .unwrap();
/// assert_eq!(router.len(), 1);
/// ```
pub struct Router {
    root: Node,
    route_count: usize,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            route_count: 0,
        }
    }

    /// Installs `handler` for `method` at `path`.
    ///
    /// Only GET, POST, PUT and DELETE are routable; other methods are
    /// rejected with [`RouteError::UnsupportedMethod`].
    pub fn register(
        &mut self,
        method: Method,
        path: &str,
        handler: Arc<dyn Handler>,
    ) -> Result<(), RouteError> {
        self.root.register(path, &method, handler)?;
        self.route_count += 1;
        Ok(())
    }

    /// Installs a GET handler at `path`.
    pub fn get(&mut self, path: &str, handler: Arc<dyn Handler>) -> Result<(), RouteError> {
        self.register(Method::GET, path, handler)
    }

    /// Installs a POST handler at `path`.
    pub fn post(&mut self, path: &str, handler: Arc<dyn Handler>) -> Result<(), RouteError> {
        self.register(Method::POST, path, handler)
    }

    /// Installs a PUT handler at `path`.
    pub fn put(&mut self, path: &str, handler: Arc<dyn Handler>) -> Result<(), RouteError> {
        self.register(Method::PUT, path, handler)
    }

    /// Installs a DELETE handler at `path`.
    pub fn delete(&mut self, path: &str, handler: Arc<dyn Handler>) -> Result<(), RouteError> {
        self.register(Method::DELETE, path, handler)
    }

    /// Mounts a static handler at `path` and freezes the subtree below it.
    ///
    /// The handler is installed in the GET slot only. The path may not
    /// contain parameter segments, and nothing may already be registered
    /// below the mount point.
    pub fn register_static(
        &mut self,
        path: &str,
        handler: Arc<dyn Handler>,
    ) -> Result<(), RouteError> {
        self.root.register_static(path, handler)?;
        self.route_count += 1;
        Ok(())
    }

    /// Appends `middlewares` at `path`. They run for every route registered
    /// at or below that node, in root-to-leaf order.
    pub fn attach(
        &mut self,
        path: &str,
        middlewares: Vec<Arc<dyn Middleware>>,
    ) -> Result<(), RouteError> {
        self.root.attach(path, middlewares)?;
        Ok(())
    }

    /// Opens a [`Scope`] rooted at `path`, attaching `middlewares` there.
    pub fn scope(
        &mut self,
        path: &str,
        middlewares: Vec<Arc<dyn Middleware>>,
    ) -> Result<Scope<'_>, RouteError> {
        self.root.attach(path, middlewares)?;
        Ok(Scope {
            router: self,
            base: path.to_string(),
        })
    }

    /// Matches `method` and `path` against the registered routes.
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> Resolution {
        match self.root.resolve(method, path) {
            Some((handler, middlewares, params)) => Resolution::Matched(RouteMatch {
                handler,
                middlewares,
                params,
            }),
            None => Resolution::NotFound,
        }
    }

    /// Number of registered routes, counting each method slot separately.
    #[must_use]
    pub fn len(&self) -> usize {
        self.route_count
    }

    /// Returns `true` when no routes have been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count == 0
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.route_count)
            .finish_non_exhaustive()
    }
}

/// A registration handle rooted at a path prefix.
///
/// Every path passed to a scope method is joined onto the scope's base
/// before registration, so `router.scope("/api", mw)?` followed by
/// `scope.get("/users", h)?` registers `/api/users` with `mw` in its chain.
pub struct Scope<'r> {
    router: &'r mut Router,
    base: String,
}

impl Scope<'_> {
    fn join(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Installs `handler` for `method` under this scope.
    pub fn register(
        &mut self,
        method: Method,
        path: &str,
        handler: Arc<dyn Handler>,
    ) -> Result<(), RouteError> {
        let full = self.join(path);
        self.router.register(method, &full, handler)
    }

    /// Installs a GET handler under this scope.
    pub fn get(&mut self, path: &str, handler: Arc<dyn Handler>) -> Result<(), RouteError> {
        self.register(Method::GET, path, handler)
    }

    /// Installs a POST handler under this scope.
    pub fn post(&mut self, path: &str, handler: Arc<dyn Handler>) -> Result<(), RouteError> {
        self.register(Method::POST, path, handler)
    }

    /// Installs a PUT handler under this scope.
    pub fn put(&mut self, path: &str, handler: Arc<dyn Handler>) -> Result<(), RouteError> {
        self.register(Method::PUT, path, handler)
    }

    /// Installs a DELETE handler under this scope.
    pub fn delete(&mut self, path: &str, handler: Arc<dyn Handler>) -> Result<(), RouteError> {
        self.register(Method::DELETE, path, handler)
    }

    /// Mounts a static handler under this scope.
    pub fn register_static(
        &mut self,
        path: &str,
        handler: Arc<dyn Handler>,
    ) -> Result<(), RouteError> {
        let full = self.join(path);
        self.router.register_static(&full, handler)
    }

    /// Appends middleware under this scope.
    pub fn attach(
        &mut self,
        path: &str,
        middlewares: Vec<Arc<dyn Middleware>>,
    ) -> Result<(), RouteError> {
        let full = self.join(path);
        self.router.attach(&full, middlewares)
    }

    /// Opens a nested scope. Bases compose, so scopes may stack.
    pub fn scope(
        &mut self,
        path: &str,
        middlewares: Vec<Arc<dyn Middleware>>,
    ) -> Result<Scope<'_>, RouteError> {
        let base = self.join(path);
        self.router.root.attach(&base, middlewares)?;
        Ok(Scope {
            router: self.router,
            base,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conjure_core::{handler_fn, middleware_fn, Outcome};

    fn noop() -> Arc<dyn Handler> {
        handler_fn(|_ctx| Box::pin(async { Outcome::Continue }))
    }

    fn pass(name: &'static str) -> Arc<dyn Middleware> {
        middleware_fn(name, |_ctx| Box::pin(async { Outcome::Continue }))
    }

    #[test]
    fn counts_routes() {
        let mut router = Router::new();
        assert!(router.is_empty());
        router.get("/a", noop()).unwrap();
        router.post("/a", noop()).unwrap();
        router.register_static("/public", noop()).unwrap();
        assert_eq!(router.len(), 3);
    }

    #[test]
    fn resolve_reports_not_found() {
        let mut router = Router::new();
        router.get("/a", noop()).unwrap();
        assert!(!router.resolve(&Method::GET, "/b").is_matched());
        assert!(!router.resolve(&Method::PUT, "/a").is_matched());
    }

    #[test]
    fn scope_composes_paths() {
        let mut router = Router::new();
        {
            let mut api = router.scope("/api", vec![]).unwrap();
            api.get("/users", noop()).unwrap();
            api.delete("/users/:id", noop()).unwrap();
        }

        assert!(router.resolve(&Method::GET, "/api/users").is_matched());
        match router.resolve(&Method::DELETE, "/api/users/7") {
            Resolution::Matched(m) => assert_eq!(m.params.get("id"), Some("7")),
            Resolution::NotFound => panic!("expected a match"),
        }
        assert!(!router.resolve(&Method::GET, "/users").is_matched());
    }

    #[test]
    fn scope_middleware_covers_nested_routes() {
        let mut router = Router::new();
        {
            let mut api = router.scope("/api", vec![pass("auth")]).unwrap();
            api.get("/users", noop()).unwrap();
            let mut v2 = api.scope("/v2", vec![pass("trace")]).unwrap();
            v2.get("/users", noop()).unwrap();
        }

        match router.resolve(&Method::GET, "/api/users") {
            Resolution::Matched(m) => {
                let names: Vec<_> = m.middlewares.iter().map(|mw| mw.name()).collect();
                assert_eq!(names, vec!["auth"]);
            }
            Resolution::NotFound => panic!("expected a match"),
        }
        match router.resolve(&Method::GET, "/api/v2/users") {
            Resolution::Matched(m) => {
                let names: Vec<_> = m.middlewares.iter().map(|mw| mw.name()).collect();
                assert_eq!(names, vec!["auth", "trace"]);
            }
            Resolution::NotFound => panic!("expected a match"),
        }
    }

    #[test]
    fn scope_middleware_does_not_leak_outside() {
        let mut router = Router::new();
        router.get("/plain", noop()).unwrap();
        {
            let mut api = router.scope("/api", vec![pass("auth")]).unwrap();
            api.get("/users", noop()).unwrap();
        }

        match router.resolve(&Method::GET, "/plain") {
            Resolution::Matched(m) => assert!(m.middlewares.is_empty()),
            Resolution::NotFound => panic!("expected a match"),
        }
    }

    #[test]
    fn root_middleware_applies_everywhere() {
        let mut router = Router::new();
        router.attach("/", vec![pass("logger")]).unwrap();
        router.get("/a/b", noop()).unwrap();

        match router.resolve(&Method::GET, "/a/b") {
            Resolution::Matched(m) => {
                let names: Vec<_> = m.middlewares.iter().map(|mw| mw.name()).collect();
                assert_eq!(names, vec!["logger"]);
            }
            Resolution::NotFound => panic!("expected a match"),
        }
    }

    #[test]
    fn registration_errors_propagate() {
        let mut router = Router::new();
        router.get("/a/:id", noop()).unwrap();
        assert!(router.get("/a/:name", noop()).is_err());
        assert!(router.register_static("/a/:id/files", noop()).is_err());
        assert_eq!(router.len(), 1);
    }
}
