//! Route registration errors.
//!
//! Every variant here is a configuration error: an illegal route topology
//! detected while registering, before the server starts serving. Callers are
//! expected to propagate these out of their startup path rather than ignore
//! them.

use http::Method;
use thiserror::Error;

/// An illegal route registration.
#[derive(Debug, Error)]
pub enum RouteError {
    /// A route or scope was registered at or beneath a static terminal.
    #[error("cannot register under static route `{0}`")]
    StaticSubtree(String),

    /// A static route's full path contains a `:param` segment.
    #[error("static route path may not contain a parameter segment: `{0}`")]
    ParamInStaticPath(String),

    /// Two different parameter names were registered at the same position.
    #[error("conflicting parameter name at `{at}`: existing `:{existing}`, requested `:{requested}`")]
    ParamConflict {
        /// Path of the node holding the existing parameter edge.
        at: String,
        /// Name already registered for the parameter edge.
        existing: String,
        /// Name the rejected registration asked for.
        requested: String,
    },

    /// The HTTP method has no handler slot (only GET/POST/PUT/DELETE do).
    #[error("unsupported method `{0}` for route registration")]
    UnsupportedMethod(Method),
}
