//! Direct, transport-free invocation of a route.

use std::sync::Arc;

use serde_json::Value;

use crate::error::RouteError;
use crate::http::request::RouteRequest;
use crate::http::response::Response;
use crate::route::adapter::adapt;
use crate::route::handler::{drive, Step};
use crate::route::Route;
use crate::routing::matcher::Params;

impl Route {
    /// Run the handler chain as a plain function call.
    ///
    /// `args` become both body and query, `params` replace the path params, every
    /// other field comes from `request`. Handlers run one at a time; the first one
    /// to send ends the chain and its value is returned. Authentication, CORS and
    /// suppression only apply to registered routes and are skipped here.
    pub async fn invoke_direct(
        &self,
        request: RouteRequest,
        args: Value,
        params: Params,
    ) -> Result<Option<Value>, RouteError> {
        let chain = self
            .handlers()
            .iter()
            .map(adapt)
            .collect::<Result<Vec<_>, _>>()?;

        let request = Arc::new(RouteRequest {
            body: args.clone(),
            query: args,
            params,
            ..request
        });

        for middleware in &chain {
            let res = Response::new();
            match drive(middleware, Arc::clone(&request), &res).await {
                Step::Fail(err) => return Err(err),
                Step::Continue | Step::Done => {
                    if res.is_sent() {
                        return Ok(res.body());
                    }
                }
            }
        }

        Ok(None)
    }

    /// [`Route::invoke_direct`] with a default request and no params.
    pub async fn call(&self, args: Value) -> Result<Option<Value>, RouteError> {
        self.invoke_direct(RouteRequest::default(), args, Params::new())
            .await
    }
}
