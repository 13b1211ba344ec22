//! Sequential middleware dispatch.

use std::sync::Arc;

use conjure_core::{Context, Handler, Middleware, Outcome};

/// Runs `middlewares` in order, then `handler`, against one context.
///
/// Each middleware sees the context after every earlier one has mutated it.
/// The first [`Outcome::Halt`] stops the chain; the handler only runs when
/// every middleware continued. The halt is returned unchanged so the server
/// can tell whether a response body was written.
pub async fn dispatch(
    ctx: &mut Context,
    middlewares: &[Arc<dyn Middleware>],
    handler: &Arc<dyn Handler>,
) -> Outcome {
    for middleware in middlewares {
        match middleware.call(ctx).await {
            Outcome::Continue => {}
            halt @ Outcome::Halt { .. } => {
                tracing::debug!(middleware = middleware.name(), "chain halted");
                return halt;
            }
        }
    }
    handler.call(ctx).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use conjure_core::{handler_fn, middleware_fn};
    use http::{Method, StatusCode};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(name: &'static str, hits: Arc<AtomicUsize>) -> Arc<dyn Middleware> {
        middleware_fn(name, move |_ctx| {
            hits.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Outcome::Continue })
        })
    }

    fn counting_handler(hits: Arc<AtomicUsize>) -> Arc<dyn Handler> {
        handler_fn(move |_ctx| {
            hits.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Outcome::Continue })
        })
    }

    #[tokio::test]
    async fn runs_chain_then_handler() {
        let mw_hits = Arc::new(AtomicUsize::new(0));
        let handler_hits = Arc::new(AtomicUsize::new(0));
        let chain = vec![
            counting("m1", Arc::clone(&mw_hits)),
            counting("m2", Arc::clone(&mw_hits)),
        ];
        let handler = counting_handler(Arc::clone(&handler_hits));

        let mut ctx = Context::new(Method::GET, "/");
        let outcome = dispatch(&mut ctx, &chain, &handler).await;

        assert_eq!(outcome, Outcome::Continue);
        assert_eq!(mw_hits.load(Ordering::SeqCst), 2);
        assert_eq!(handler_hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn halt_short_circuits_rest_of_chain() {
        let later_hits = Arc::new(AtomicUsize::new(0));
        let handler_hits = Arc::new(AtomicUsize::new(0));
        let reject = middleware_fn("reject", |ctx| {
            ctx.set_status(StatusCode::UNAUTHORIZED);
            let outcome = ctx.send_error_message("nope");
            Box::pin(async move { outcome })
        });
        let chain = vec![reject, counting("later", Arc::clone(&later_hits))];
        let handler = counting_handler(Arc::clone(&handler_hits));

        let mut ctx = Context::new(Method::GET, "/");
        let outcome = dispatch(&mut ctx, &chain, &handler).await;

        assert_eq!(outcome, Outcome::halt_written());
        assert_eq!(later_hits.load(Ordering::SeqCst), 0);
        assert_eq!(handler_hits.load(Ordering::SeqCst), 0);
        assert_eq!(ctx.response().status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn bare_halt_is_passed_through() {
        let drop_request = middleware_fn("drop", |_ctx| Box::pin(async { Outcome::halt() }));
        let handler = handler_fn(|ctx| {
            ctx.send_string("never");
            Box::pin(async { Outcome::Continue })
        });

        let mut ctx = Context::new(Method::GET, "/");
        let outcome = dispatch(&mut ctx, &[drop_request], &handler).await;

        assert_eq!(outcome, Outcome::halt());
        assert!(ctx.response().body.is_empty());
    }

    #[tokio::test]
    async fn empty_chain_runs_handler_directly() {
        let handler = handler_fn(|ctx| {
            ctx.send_string("hi");
            Box::pin(async { Outcome::Continue })
        });

        let mut ctx = Context::new(Method::GET, "/");
        let outcome = dispatch(&mut ctx, &[], &handler).await;

        assert_eq!(outcome, Outcome::Continue);
        assert_eq!(&ctx.response().body[..], b"hi");
    }
}
