//! Embeddable HTTP router and middleware framework.
//!
//! Conjure routes requests through a path-segment trie (literal and `:name`
//! parameter segments, plus frozen static-file mounts), binds each request
//! to a typed [`Context`], and runs handlers behind ordered middleware
//! chains that can short-circuit. The [`App`] facade wires the router to a
//! hyper/tokio server; the underlying crates can also be used on their own
//! when embedding the router inside another transport.
//!
//! # Example
//!
//! ```rust,no_run
//! use conjure::prelude::*;
//! use conjure::BearerAuth;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     conjure::init_logging();
//!
//!     let mut app = App::new();
//!     app.serve_dir("/public", "./public")?;
//!     {
//!         let mut api = app.scope("/api", vec![Arc::new(BearerAuth::new("secret"))])?;
//!         api.get("/whoami", handler_fn(|ctx| {
//!             let sub = ctx
//!                 .claims()
//!                 .and_then(|c| c.get("sub"))
//!                 .and_then(|v| v.as_str())
//!                 .unwrap_or("unknown")
//!                 .to_string();
//!             ctx.send_string(sub);
//!             Box::pin(async { Outcome::Continue })
//!         }))?;
//!     }
//!     app.serve().await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod app;

pub use app::App;

pub use conjure_core::{
    handler_fn, middleware_fn, mime_for_path, BoxFuture, Context, FileMap, Handler, Middleware,
    Outcome, ResponseParts, UploadedFile, ValueError, Values, ValuesList, CLAIMS_KEY,
};
pub use conjure_middleware::{dispatch, issue_token, AuthError, BearerAuth};
pub use conjure_router::{Resolution, RouteError, RouteMatch, Router, Scope};
pub use conjure_server::{
    DirFiles, FileRoute, Server, ServerConfig, ServerError, ShutdownSignal,
};

pub use http::{Method, StatusCode};

/// Commonly used types, for glob import.
pub mod prelude {
    pub use crate::{
        handler_fn, middleware_fn, App, Context, Handler, Middleware, Outcome, Router,
    };
}

/// Installs a formatted `tracing` subscriber filtered by `RUST_LOG`
/// (defaulting to `info`). Calling it more than once is harmless.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
