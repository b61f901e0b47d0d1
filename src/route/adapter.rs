//! Handler normalization.
//!
//! # Responsibilities
//! - Turn either handler shape into continuation-style [`Middleware`]
//! - Deliver deferred failures to the continuation exactly once
//! - Reject pending futures when the chain is built, not per request

use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::error::RouteError;
use crate::http::request::RouteRequest;
use crate::http::response::Response;
use crate::route::handler::{middleware, Handler, Middleware, Next};

/// Normalize `handler` into continuation-style middleware.
pub fn adapt(handler: &Handler) -> Result<Middleware, RouteError> {
    match handler {
        Handler::Continuation(f) => {
            let f = Arc::clone(f);
            Ok(middleware(
                move |req: Arc<RouteRequest>, res: Response, next: Next| -> BoxFuture<'static, ()> {
                    f(req, res, next);
                    Box::pin(async {})
                },
            ))
        }
        Handler::Deferred(f) => {
            let f = Arc::clone(f);
            Ok(middleware(
                move |req: Arc<RouteRequest>, res: Response, next: Next| -> BoxFuture<'static, ()> {
                    let task = f(req, res);
                    Box::pin(async move {
                        if let Err(err) = task.await {
                            tracing::debug!(error = %err, "Deferred handler failed");
                            next.fail(err);
                        }
                    })
                },
            ))
        }
        Handler::Pending(_) => Err(RouteError::Content(
            "handlers need to be (req, res, next) or async (req, res), not an in-flight future"
                .to_string(),
        )),
    }
}
