//! CORS support built on `tower_http::cors`.
//!
//! The CORS layer owns the protocol. Routes only need two things from it: headers
//! to copy onto ordinary responses, and a complete answer for `OPTIONS` preflights.
//! Both are obtained by running the layer around a no-op inner service.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method, Request, Response as HttpResponse};
use futures_util::future::BoxFuture;
use tower::{Layer, ServiceExt};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};

use crate::config::schema::CorsConfig;
use crate::config::validation::validate_cors;
use crate::error::RouteError;
use crate::http::request::RouteRequest;
use crate::http::response::Response;
use crate::route::handler::{middleware, Middleware, Next};

/// A CORS policy ready to produce middleware.
#[derive(Clone)]
pub struct Cors {
    layer: CorsLayer,
}

impl Cors {
    pub fn from_config(config: &CorsConfig) -> Result<Self, RouteError> {
        let errors = validate_cors("cors", config);
        if !errors.is_empty() {
            let message = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(RouteError::Content(message));
        }

        let origins = if config.allows_any_origin() {
            AllowOrigin::from(Any)
        } else {
            AllowOrigin::list(
                config
                    .origins
                    .iter()
                    .filter_map(|o| HeaderValue::from_str(o).ok()),
            )
        };

        let methods = if config.methods.is_empty() {
            AllowMethods::mirror_request()
        } else {
            AllowMethods::list(
                config
                    .methods
                    .iter()
                    .filter_map(|m| Method::from_bytes(m.as_bytes()).ok()),
            )
        };

        let headers = if config.headers.is_empty() {
            AllowHeaders::mirror_request()
        } else {
            AllowHeaders::list(
                config
                    .headers
                    .iter()
                    .filter_map(|h| HeaderName::from_bytes(h.as_bytes()).ok()),
            )
        };

        let mut layer = CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(headers)
            .allow_credentials(config.credentials);
        if let Some(secs) = config.max_age_secs {
            layer = layer.max_age(Duration::from_secs(secs));
        }

        Ok(Self { layer })
    }

    /// Middleware prepended to every handler: copies CORS headers, then continues.
    pub fn middleware(&self) -> Middleware {
        let layer = self.layer.clone();
        middleware(
            move |req: Arc<RouteRequest>, res: Response, next: Next| -> BoxFuture<'static, ()> {
                let layer = layer.clone();
                Box::pin(async move {
                    let answer = run_layer(&layer, &req).await;
                    res.merge_headers(answer.headers());
                    next.proceed();
                })
            },
        )
    }

    /// Handler for `OPTIONS` preflight requests.
    pub fn preflight(&self) -> Middleware {
        let layer = self.layer.clone();
        middleware(
            move |req: Arc<RouteRequest>, res: Response, _next: Next| -> BoxFuture<'static, ()> {
                let layer = layer.clone();
                Box::pin(async move {
                    let answer = run_layer(&layer, &req).await;
                    res.status(answer.status());
                    res.merge_headers(answer.headers());
                    res.send(serde_json::Value::Null);
                })
            },
        )
    }
}

async fn run_layer(layer: &CorsLayer, req: &RouteRequest) -> HttpResponse<()> {
    let mut probe = Request::new(());
    *probe.method_mut() = req.method.clone();
    *probe.headers_mut() = req.headers.clone();

    let inner = tower::service_fn(|_: Request<()>| async { Ok::<_, Infallible>(HttpResponse::new(())) });
    layer
        .layer(inner)
        .oneshot(probe)
        .await
        .unwrap_or_else(|never| match never {})
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::handler::{drive, Step};
    use axum::http::header;

    fn preflight_request(origin: &str) -> RouteRequest {
        let mut req = RouteRequest::new(Method::OPTIONS, "/");
        req.headers.insert(header::ORIGIN, origin.parse().unwrap());
        req.headers.insert(
            header::ACCESS_CONTROL_REQUEST_METHOD,
            HeaderValue::from_static("POST"),
        );
        req
    }

    #[tokio::test]
    async fn test_preflight_answers_with_allow_headers() {
        let cors = Cors::from_config(&CorsConfig::default()).unwrap();
        let res = Response::new();
        let step = drive(&cors.preflight(), Arc::new(preflight_request("https://a.test")), &res).await;
        assert!(matches!(step, Step::Done));
        assert!(res.is_sent());

        let http = res.into_http();
        assert_eq!(http.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert!(http
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
    }

    #[tokio::test]
    async fn test_middleware_adds_headers_and_continues() {
        let config = CorsConfig {
            origins: vec!["https://a.test".into()],
            credentials: true,
            ..CorsConfig::default()
        };
        let cors = Cors::from_config(&config).unwrap();

        let mut req = RouteRequest::new(Method::GET, "/");
        req.headers
            .insert(header::ORIGIN, HeaderValue::from_static("https://a.test"));
        let res = Response::new();
        let step = drive(&cors.middleware(), Arc::new(req), &res).await;
        assert!(matches!(step, Step::Continue));
        assert!(!res.is_sent());

        let http = res.into_http();
        assert_eq!(
            http.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://a.test"
        );
        assert_eq!(
            http.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
            "true"
        );
    }

    #[test]
    fn test_invalid_config_is_content_error() {
        let config = CorsConfig {
            credentials: true,
            ..CorsConfig::default()
        };
        assert!(matches!(
            Cors::from_config(&config),
            Err(RouteError::Content(_))
        ));
    }
}
