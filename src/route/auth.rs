//! Authentication gating for routes that require it.

use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::error::RouteError;
use crate::http::request::RouteRequest;
use crate::http::response::Response;
use crate::route::adapter::adapt;
use crate::route::handler::{middleware, Handler, Middleware, Next};

/// Decides whether a request is authenticated.
pub trait Authenticator: Send + Sync {
    fn is_authenticated(&self, req: &RouteRequest) -> bool;
}

impl<F> Authenticator for F
where
    F: Fn(&RouteRequest) -> bool + Send + Sync,
{
    fn is_authenticated(&self, req: &RouteRequest) -> bool {
        self(req)
    }
}

/// Trusts the session state recorded on the request by upstream middleware.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionAuthenticator;

impl Authenticator for SessionAuthenticator {
    fn is_authenticated(&self, req: &RouteRequest) -> bool {
        req.authenticated
    }
}

/// Wrap `handler` so it only runs for authenticated requests.
///
/// Unauthenticated requests go to `skipped` when one is configured and fall
/// through to the next registration otherwise. An authenticated request with
/// no principal is a permissions fault.
pub fn gate(
    handler: &Handler,
    skipped: Option<&Handler>,
    authenticator: Arc<dyn Authenticator>,
) -> Result<Middleware, RouteError> {
    let main = adapt(handler)?;
    let skipped = skipped.map(adapt).transpose()?;

    Ok(middleware(
        move |req: Arc<RouteRequest>, res: Response, next: Next| -> BoxFuture<'static, ()> {
            if !authenticator.is_authenticated(&req) {
                return match &skipped {
                    Some(fallback) => fallback(req, res, next),
                    None => {
                        next.proceed();
                        Box::pin(async {})
                    }
                };
            }

            if req.user.is_none() {
                tracing::warn!(path = %req.path, "Authenticated request has no principal");
                next.fail(RouteError::Permissions("No user available on request".to_string()));
                return Box::pin(async {});
            }

            main(req, res, next)
        },
    ))
}
