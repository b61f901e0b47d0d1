//! Handler shapes, the guarded continuation, and the middleware type they normalize to.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future::BoxFuture;
use tokio::sync::oneshot;

use crate::error::RouteError;
use crate::http::request::RouteRequest;
use crate::http::response::Response;

pub type HandlerResult = Result<(), RouteError>;

type ContinuationFn = dyn Fn(Arc<RouteRequest>, Response, Next) + Send + Sync;
type DeferredFn = dyn Fn(Arc<RouteRequest>, Response) -> BoxFuture<'static, HandlerResult> + Send + Sync;

/// Continuation-style middleware: every handler shape is normalized to this.
pub type Middleware = Arc<dyn Fn(Arc<RouteRequest>, Response, Next) -> BoxFuture<'static, ()> + Send + Sync>;

/// Wrap a closure as [`Middleware`].
pub fn middleware<F>(f: F) -> Middleware
where
    F: Fn(Arc<RouteRequest>, Response, Next) -> BoxFuture<'static, ()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A request handler, tagged with its shape when it is created.
#[derive(Clone)]
pub enum Handler {
    /// `(req, res, next)`: completes by sending, or by calling `next` at most once.
    Continuation(Arc<ContinuationFn>),

    /// `async (req, res)`: completes by sending; an `Err` goes to the continuation.
    Deferred(Arc<DeferredFn>),

    /// A future that was already started and handed in where a handler was expected.
    /// It can never be composed.
    Pending(Arc<Mutex<Option<BoxFuture<'static, HandlerResult>>>>),
}

impl Handler {
    pub fn continuation<F>(f: F) -> Self
    where
        F: Fn(Arc<RouteRequest>, Response, Next) + Send + Sync + 'static,
    {
        Handler::Continuation(Arc::new(f))
    }

    pub fn deferred<F, Fut>(f: F) -> Self
    where
        F: Fn(Arc<RouteRequest>, Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Handler::Deferred(Arc::new(move |req: Arc<RouteRequest>, res: Response| -> BoxFuture<'static, HandlerResult> {
            Box::pin(f(req, res))
        }))
    }

    pub fn pending<Fut>(future: Fut) -> Self
    where
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Handler::Pending(Arc::new(Mutex::new(Some(Box::pin(future)))))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Handler::Continuation(_) => "continuation",
            Handler::Deferred(_) => "deferred",
            Handler::Pending(_) => "pending",
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler").field(&self.kind()).finish()
    }
}

type Signal = Option<RouteError>;

/// Guarded continuation. Clones share one guard: only the first call has effect.
///
/// When bound to a [`Response`], sending that response also counts as the first
/// completion, so a later `next` call is discarded.
#[derive(Clone)]
pub struct Next {
    slot: Arc<Mutex<Option<oneshot::Sender<Signal>>>>,
    response: Option<Response>,
}

impl Next {
    /// A fresh continuation plus the receiver that observes it.
    pub fn channel() -> (Self, oneshot::Receiver<Signal>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                slot: Arc::new(Mutex::new(Some(tx))),
                response: None,
            },
            rx,
        )
    }

    /// Like [`Next::channel`], but completed as soon as `res` is sent.
    pub fn guarding(res: &Response) -> (Self, oneshot::Receiver<Signal>) {
        let (mut next, rx) = Self::channel();
        next.response = Some(res.clone());
        (next, rx)
    }

    /// Fire the continuation. Returns `false` if it had already fired.
    pub fn call(&self, err: Option<RouteError>) -> bool {
        let sender = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let responded = self.response.as_ref().is_some_and(Response::is_sent);
        match sender {
            Some(_) if responded => {
                if let Some(err) = err {
                    tracing::debug!(error = %err, "Response already sent, discarding error");
                }
                false
            }
            Some(tx) => {
                // The receiver may be gone once the request has completed.
                let _ = tx.send(err);
                true
            }
            None => {
                if let Some(err) = err {
                    tracing::debug!(error = %err, "Continuation already fired, discarding error");
                }
                false
            }
        }
    }

    /// Pass control to whatever is registered next.
    pub fn proceed(&self) -> bool {
        self.call(None)
    }

    /// Deliver an error to the error channel.
    pub fn fail(&self, err: RouteError) -> bool {
        self.call(Some(err))
    }

    pub fn has_fired(&self) -> bool {
        self.response.as_ref().is_some_and(Response::is_sent)
            || self
                .slot
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .is_none()
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("fired", &self.has_fired())
            .finish()
    }
}

/// How one middleware invocation ended.
#[derive(Debug)]
pub enum Step {
    /// `next()` was called without an error.
    Continue,
    /// `next(err)` was called.
    Fail(RouteError),
    /// The response was produced, or the handler finished without continuing.
    Done,
}

/// Run one middleware and wait for it to continue, fail, or finish.
pub async fn drive(middleware: &Middleware, req: Arc<RouteRequest>, res: &Response) -> Step {
    let (next, fired) = Next::guarding(res);
    middleware(req, res.clone(), next).await;

    tokio::select! {
        biased;
        signal = fired => match signal {
            Ok(None) => Step::Continue,
            Ok(Some(err)) => Step::Fail(err),
            // Every copy of `next` was dropped without being called.
            Err(_) => Step::Done,
        },
        _ = res.sent() => Step::Done,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_next_fires_once() {
        let (next, mut rx) = Next::channel();
        let twin = next.clone();

        assert!(next.fail(RouteError::status(StatusCode::CONFLICT, "first")));
        assert!(!twin.fail(RouteError::status(StatusCode::GONE, "second")));
        assert!(!next.proceed());
        assert!(twin.has_fired());

        let signal = rx.try_recv().unwrap().unwrap();
        assert_eq!(signal.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_handler_kinds() {
        let c = Handler::continuation(|_req, res, _next| {
            res.send("ok");
        });
        let d = Handler::deferred(|_req, _res| async { Ok(()) });
        let p = Handler::pending(async { Ok(()) });
        assert_eq!(c.kind(), "continuation");
        assert_eq!(d.kind(), "deferred");
        assert_eq!(p.kind(), "pending");
        assert_eq!(format!("{d:?}"), "Handler(\"deferred\")");
    }

    #[tokio::test]
    async fn test_drive_outcomes() {
        let req = Arc::new(RouteRequest::default());

        let proceed = middleware(|_req, _res, next| {
            next.proceed();
            Box::pin(async {})
        });
        let res = Response::new();
        assert!(matches!(drive(&proceed, req.clone(), &res).await, Step::Continue));

        let respond = middleware(|_req, res, _next| {
            res.send("hi");
            Box::pin(async {})
        });
        let res = Response::new();
        assert!(matches!(drive(&respond, req.clone(), &res).await, Step::Done));
        assert!(res.is_sent());

        let dropped = middleware(|_req, _res, next| {
            drop(next);
            Box::pin(async {})
        });
        let res = Response::new();
        assert!(matches!(drive(&dropped, req.clone(), &res).await, Step::Done));
        assert!(!res.is_sent());
    }

    #[test]
    fn test_send_completes_guarded_continuation() {
        let res = Response::new();
        let (next, mut rx) = Next::guarding(&res);

        res.send("ok");
        assert!(next.has_fired());
        assert!(!next.fail(RouteError::handler("too late")));
        // The sender was dropped without a signal.
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_drive_prefers_earlier_send_over_late_error() {
        let deferred = middleware(|_req, res, next| {
            Box::pin(async move {
                res.send("ok");
                tokio::task::yield_now().await;
                next.fail(RouteError::handler("late rejection"));
            })
        });
        let res = Response::new();
        let step = drive(&deferred, Arc::new(RouteRequest::default()), &res).await;
        assert!(matches!(step, Step::Done));
        assert_eq!(res.body(), Some(serde_json::json!("ok")));
    }

    #[tokio::test]
    async fn test_drive_waits_for_late_continuation() {
        let late = middleware(|_req, _res, next| {
            tokio::spawn(async move {
                tokio::task::yield_now().await;
                next.fail(RouteError::Permissions("late".into()));
            });
            Box::pin(async {})
        });
        let res = Response::new();
        let step = drive(&late, Arc::new(RouteRequest::default()), &res).await;
        assert!(matches!(step, Step::Fail(RouteError::Permissions(_))));
    }
}
