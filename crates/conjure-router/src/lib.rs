//! Path-matching trie router for conjure.
//!
//! Paths are split on `/` into segments. A segment is either a literal,
//! matched by exact text, or a parameter written `:name`, which matches any
//! one segment and binds its text under `name`. Matching walks the trie one
//! segment at a time with no backtracking, and a literal child always wins
//! over the parameter child at the same node.
//!
//! Static mounts are terminal: once a request path reaches one, the
//! remaining segments are not decomposed and the mounted handler sees the
//! full request path. Middleware attach to nodes and are collected in
//! root-to-leaf order along the matched path.
//!
//! This crate only matches. Running the middleware chain and the handler is
//! the dispatcher's job (see `conjure-middleware`), and turning a request
//! into a [`conjure_core::Context`] belongs to the server layer.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod node;
mod router;

pub use error::RouteError;
pub use router::{Resolution, RouteMatch, Router, Scope};
