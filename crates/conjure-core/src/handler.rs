//! Handler and middleware traits, and the pipeline [`Outcome`].
//!
//! Both handlers and middleware take a mutable [`Context`] and return an
//! [`Outcome`]. A middleware that rejects a request is expected to have
//! written its own response (`Outcome::halt_written()`); a bare
//! `Outcome::halt()` tells the caller a fallback response is still needed.

use crate::context::Context;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A boxed future, as returned by handlers and middleware.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The result of one middleware or handler step.
///
/// The pipeline stops at the first `Halt` and never runs downstream steps
/// after it. The `written` flag records whether the halting step already
/// wrote a response body, so the server knows whether a fallback envelope is
/// still owed to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Proceed to the next middleware, or finish successfully.
    Continue,
    /// Stop the chain.
    Halt {
        /// Whether a response has already been written.
        written: bool,
    },
}

impl Outcome {
    /// A halt whose response still needs to be written by the server.
    #[must_use]
    pub const fn halt() -> Self {
        Self::Halt { written: false }
    }

    /// A halt whose response has already been written.
    #[must_use]
    pub const fn halt_written() -> Self {
        Self::Halt { written: true }
    }

    /// Returns true for either halt variant.
    #[must_use]
    pub const fn is_halt(self) -> bool {
        matches!(self, Self::Halt { .. })
    }
}

/// A request handler.
///
/// Handlers own the terminal step of the dispatch pipeline. They write their
/// response through the [`Context`] and report failure by halting; the
/// pipeline never writes on a handler's behalf.
pub trait Handler: Send + Sync + 'static {
    /// Runs the handler against the request context.
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Outcome>;
}

/// An ordered unit of work run before the handler.
///
/// A middleware holds no per-request state beyond what it captured at
/// construction time (a secret key, a header name). It communicates with
/// later middleware and the handler only through [`Context::set_storage`].
pub trait Middleware: Send + Sync + 'static {
    /// A short name used in trace events.
    fn name(&self) -> &'static str {
        "anonymous"
    }

    /// Runs the middleware against the request context.
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Outcome>;
}

struct FnHandler<F>(F);

impl<F> Handler for FnHandler<F>
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Outcome> + Send + Sync + 'static,
{
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Outcome> {
        (self.0)(ctx)
    }
}

/// Wraps a closure as a shared [`Handler`].
///
/// # Example
///
/// ```rust
/// use conjure_core::{handler_fn, Outcome};
///
/// let handler = handler_fn(|ctx| {
///     ctx.send_string("hello");
///     Box::pin(async { Outcome::Continue })
/// });
/// ```
pub fn handler_fn<F>(f: F) -> Arc<dyn Handler>
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Outcome> + Send + Sync + 'static,
{
    Arc::new(FnHandler(f))
}

struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Outcome> + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Outcome> {
        (self.func)(ctx)
    }
}

/// Wraps a closure as a shared, named [`Middleware`].
///
/// # Example
///
/// ```rust
/// use conjure_core::{middleware_fn, Outcome};
///
/// let timing = middleware_fn("timing", |ctx| {
///     ctx.set_storage("started", serde_json::json!(true));
///     Box::pin(async { Outcome::Continue })
/// });
/// assert_eq!(timing.name(), "timing");
/// ```
pub fn middleware_fn<F>(name: &'static str, f: F) -> Arc<dyn Middleware>
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Outcome> + Send + Sync + 'static,
{
    Arc::new(FnMiddleware { name, func: f })
}
