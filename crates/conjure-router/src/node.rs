//! Trie node implementation.
//!
//! Each [`Node`] sits at one path-segment boundary. A node owns its literal
//! children (keyed by exact segment text), at most one parameter child, the
//! middleware attached at its position, and one handler slot per HTTP
//! method. Marking a node as a static terminal freezes its subtree: the
//! remainder of any request path past it is handed to the static handler
//! verbatim instead of being decomposed further.

use std::collections::HashMap;
use std::sync::Arc;

use conjure_core::{Handler, Middleware, Values};
use http::Method;

use crate::error::RouteError;

/// Per-method handler slots. Static routes only ever populate the GET slot.
#[derive(Default)]
pub(crate) struct MethodSlots {
    get: Option<Arc<dyn Handler>>,
    post: Option<Arc<dyn Handler>>,
    put: Option<Arc<dyn Handler>>,
    delete: Option<Arc<dyn Handler>>,
}

impl MethodSlots {
    fn slot_mut(
        &mut self,
        method: &Method,
    ) -> Result<&mut Option<Arc<dyn Handler>>, RouteError> {
        if *method == Method::GET {
            Ok(&mut self.get)
        } else if *method == Method::POST {
            Ok(&mut self.post)
        } else if *method == Method::PUT {
            Ok(&mut self.put)
        } else if *method == Method::DELETE {
            Ok(&mut self.delete)
        } else {
            Err(RouteError::UnsupportedMethod(method.clone()))
        }
    }

    fn get(&self, method: &Method) -> Option<&Arc<dyn Handler>> {
        if *method == Method::GET {
            self.get.as_ref()
        } else if *method == Method::POST {
            self.post.as_ref()
        } else if *method == Method::PUT {
            self.put.as_ref()
        } else if *method == Method::DELETE {
            self.delete.as_ref()
        } else {
            None
        }
    }
}

/// One path-segment boundary in the routing trie.
pub(crate) struct Node {
    /// Literal segment text, or the parameter name when reached through the
    /// parent's parameter edge.
    label: String,

    /// Complete path from the trie root, fixed at registration time. Static
    /// handlers use it to compute the request-path remainder.
    full_path: String,

    /// Literal children, keyed by exact segment text.
    children: HashMap<String, Node>,

    /// The singular parameter child, if any.
    param: Option<Box<Node>>,

    /// Middleware attached here, inherited by every descendant.
    middlewares: Vec<Arc<dyn Middleware>>,

    /// Handlers by HTTP method.
    handlers: MethodSlots,

    /// Once true, no further registration may pass through this node.
    static_terminal: bool,
}

impl Node {
    pub(crate) fn root() -> Self {
        Self::new("", String::new())
    }

    fn new(label: impl Into<String>, full_path: String) -> Self {
        Self {
            label: label.into(),
            full_path,
            children: HashMap::new(),
            param: None,
            middlewares: Vec::new(),
            handlers: MethodSlots::default(),
            static_terminal: false,
        }
    }

    pub(crate) fn full_path(&self) -> &str {
        &self.full_path
    }

    /// Walks `path` from this node, creating nodes as needed, and returns the
    /// terminal node. Fails if the walk passes through or lands on a static
    /// terminal, or if a parameter segment conflicts with an existing one.
    pub(crate) fn walk_mut(&mut self, path: &str) -> Result<&mut Node, RouteError> {
        let mut current = self;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if current.static_terminal {
                return Err(RouteError::StaticSubtree(current.full_path.clone()));
            }
            let parent_path = current.full_path.clone();
            current = if let Some(name) = segment.strip_prefix(':') {
                if let Some(param) = &current.param {
                    if param.label != name {
                        return Err(RouteError::ParamConflict {
                            at: parent_path,
                            existing: param.label.clone(),
                            requested: name.to_string(),
                        });
                    }
                }
                &mut **current.param.get_or_insert_with(|| {
                    Box::new(Node::new(name, format!("{parent_path}/:{name}")))
                })
            } else {
                current
                    .children
                    .entry(segment.to_string())
                    .or_insert_with(|| {
                        Node::new(segment, format!("{parent_path}/{segment}"))
                    })
            };
        }
        if current.static_terminal {
            return Err(RouteError::StaticSubtree(current.full_path.clone()));
        }
        Ok(current)
    }

    /// Installs `handler` for `method` at the end of `path`.
    pub(crate) fn register(
        &mut self,
        path: &str,
        method: &Method,
        handler: Arc<dyn Handler>,
    ) -> Result<(), RouteError> {
        let node = self.walk_mut(path)?;
        *node.handlers.slot_mut(method)? = Some(handler);
        Ok(())
    }

    /// Installs `handler` in the GET slot at the end of `path` and marks the
    /// terminal node static.
    ///
    /// Validation is eager: the full path may not contain a parameter
    /// segment, and the terminal node may not already have descendants
    /// (registration order must not allow a deeper route to slip under a
    /// static mount).
    pub(crate) fn register_static(
        &mut self,
        path: &str,
        handler: Arc<dyn Handler>,
    ) -> Result<(), RouteError> {
        if path.split('/').any(|s| s.starts_with(':')) {
            return Err(RouteError::ParamInStaticPath(path.to_string()));
        }
        let node = self.walk_mut(path)?;
        if !node.children.is_empty() || node.param.is_some() {
            return Err(RouteError::StaticSubtree(node.full_path.clone()));
        }
        *node.handlers.slot_mut(&Method::GET)? = Some(handler);
        node.static_terminal = true;
        Ok(())
    }

    /// Appends middleware at the end of `path`, creating nodes as needed.
    pub(crate) fn attach(
        &mut self,
        path: &str,
        middlewares: Vec<Arc<dyn Middleware>>,
    ) -> Result<&mut Node, RouteError> {
        let node = self.walk_mut(path)?;
        node.middlewares.extend(middlewares);
        Ok(node)
    }

    /// Resolves a request path against this subtree.
    ///
    /// Literal children win over the parameter child; there is no
    /// backtracking. A static terminal stops segment consumption, leaving the
    /// remainder to the installed handler. Middleware are collected in
    /// root-to-leaf order. Returns `None` when no node matches or the matched
    /// node has no handler for `method`.
    pub(crate) fn resolve(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(Arc<dyn Handler>, Vec<Arc<dyn Middleware>>, Values)> {
        let mut current = self;
        let mut params = Values::new();
        let mut chain: Vec<Arc<dyn Middleware>> = current.middlewares.clone();

        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if current.static_terminal {
                break;
            }
            current = if let Some(child) = current.children.get(segment) {
                child
            } else if let Some(param) = current.param.as_deref() {
                params.insert(param.label.clone(), segment);
                param
            } else {
                return None;
            };
            chain.extend(current.middlewares.iter().cloned());
        }

        let handler = current.handlers.get(method)?.clone();
        Some((handler, chain, params))
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("label", &self.label)
            .field("full_path", &self.full_path)
            .field("children", &self.children.keys().collect::<Vec<_>>())
            .field("param", &self.param.as_ref().map(|p| &p.label))
            .field("middleware_count", &self.middlewares.len())
            .field("static_terminal", &self.static_terminal)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conjure_core::{handler_fn, Outcome};

    fn noop() -> Arc<dyn Handler> {
        handler_fn(|_ctx| Box::pin(async { Outcome::Continue }))
    }

    #[test]
    fn literal_walk_records_full_path() {
        let mut root = Node::root();
        let node = root.walk_mut("/api/v1/users").unwrap();
        assert_eq!(node.full_path(), "/api/v1/users");
    }

    #[test]
    fn param_walk_records_full_path() {
        let mut root = Node::root();
        let node = root.walk_mut("/users/:id/posts").unwrap();
        assert_eq!(node.full_path(), "/users/:id/posts");
    }

    #[test]
    fn resolve_literal() {
        let mut root = Node::root();
        root.register("/users", &Method::GET, noop()).unwrap();

        let (_, chain, params) = root.resolve(&Method::GET, "/users").unwrap();
        assert!(chain.is_empty());
        assert!(params.is_empty());
    }

    #[test]
    fn resolve_binds_param() {
        let mut root = Node::root();
        root.register("/users/:id/posts", &Method::GET, noop())
            .unwrap();

        let (_, _, params) = root.resolve(&Method::GET, "/users/42/posts").unwrap();
        assert_eq!(params.get("id"), Some("42"));
    }

    #[test]
    fn literal_beats_param() {
        let mut root = Node::root();
        root.register("/a/:x", &Method::GET, noop()).unwrap();
        root.register("/a/fixed", &Method::POST, noop()).unwrap();

        // The literal child is tried first; the POST slot lives there, so a
        // GET of /a/fixed does not fall back to the parameter route.
        assert!(root.resolve(&Method::GET, "/a/fixed").is_none());
        assert!(root.resolve(&Method::POST, "/a/fixed").is_some());
        let (_, _, params) = root.resolve(&Method::GET, "/a/other").unwrap();
        assert_eq!(params.get("x"), Some("other"));
    }

    #[test]
    fn resolve_method_miss_is_not_found() {
        let mut root = Node::root();
        root.register("/users", &Method::GET, noop()).unwrap();

        assert!(root.resolve(&Method::DELETE, "/users").is_none());
    }

    #[test]
    fn resolve_unknown_path_is_not_found() {
        let mut root = Node::root();
        root.register("/users", &Method::GET, noop()).unwrap();

        assert!(root.resolve(&Method::GET, "/posts").is_none());
    }

    #[test]
    fn static_terminal_stops_matching() {
        let mut root = Node::root();
        root.register_static("/files", noop()).unwrap();

        // Remainder segments are not decomposed; the GET slot is selected.
        assert!(root.resolve(&Method::GET, "/files/sub/dir/pic.png").is_some());
        // Static handlers only populate the GET slot.
        assert!(root.resolve(&Method::POST, "/files/sub/dir/pic.png").is_none());
    }

    #[test]
    fn static_path_with_param_segment_is_rejected() {
        let mut root = Node::root();
        let err = root.register_static("/a/:id/static", noop()).unwrap_err();
        assert!(matches!(err, RouteError::ParamInStaticPath(_)));
    }

    #[test]
    fn registration_under_static_node_is_rejected() {
        let mut root = Node::root();
        root.register_static("/files", noop()).unwrap();

        let err = root
            .register("/files/extra", &Method::GET, noop())
            .unwrap_err();
        assert!(matches!(err, RouteError::StaticSubtree(_)));

        let err = root.register("/files", &Method::POST, noop()).unwrap_err();
        assert!(matches!(err, RouteError::StaticSubtree(_)));
    }

    #[test]
    fn static_over_existing_descendants_is_rejected() {
        let mut root = Node::root();
        root.register("/files/deep", &Method::GET, noop()).unwrap();

        let err = root.register_static("/files", noop()).unwrap_err();
        assert!(matches!(err, RouteError::StaticSubtree(_)));
    }

    #[test]
    fn conflicting_param_names_are_rejected() {
        let mut root = Node::root();
        root.register("/a/:id", &Method::GET, noop()).unwrap();

        let err = root.register("/a/:name", &Method::GET, noop()).unwrap_err();
        assert!(matches!(
            err,
            RouteError::ParamConflict { ref existing, ref requested, .. }
                if existing == "id" && requested == "name"
        ));
    }

    #[test]
    fn unsupported_method_is_rejected() {
        let mut root = Node::root();
        let err = root
            .register("/users", &Method::PATCH, noop())
            .unwrap_err();
        assert!(matches!(err, RouteError::UnsupportedMethod(_)));
    }

    #[test]
    fn middleware_collected_root_to_leaf() {
        use conjure_core::middleware_fn;

        let mut root = Node::root();
        root.attach("/a", vec![middleware_fn("m1", |_| {
            Box::pin(async { Outcome::Continue })
        })])
        .unwrap();
        root.attach("/a/b", vec![middleware_fn("m2", |_| {
            Box::pin(async { Outcome::Continue })
        })])
        .unwrap();
        root.register("/a/b/c", &Method::GET, noop()).unwrap();

        let (_, chain, _) = root.resolve(&Method::GET, "/a/b/c").unwrap();
        let names: Vec<_> = chain.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["m1", "m2"]);
    }

    #[test]
    fn trailing_slash_is_normalized() {
        let mut root = Node::root();
        root.register("/users", &Method::GET, noop()).unwrap();

        assert!(root.resolve(&Method::GET, "/users/").is_some());
    }
}
