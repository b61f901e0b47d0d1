//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router around the dispatcher
//! - Wire up middleware (tracing, timeouts, body limits, request ID)
//! - Serve on a listener until shutdown

use std::future::Future;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::http::dispatch::{Dispatcher, Registration};

/// HTTP server for crawled routes.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
}

impl HttpServer {
    /// Create a server over `registrations`, in the order given.
    pub fn new(config: AppConfig, registrations: impl IntoIterator<Item = Registration>) -> Self {
        let dispatcher = Dispatcher::new(registrations)
            .with_body_limit(config.limits.max_body_bytes)
            .with_metrics(config.observability.metrics_enabled);
        tracing::info!(layers = dispatcher.len(), "Dispatcher ready");

        let router = Self::build_router(&config, dispatcher);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, dispatcher: Dispatcher) -> Router {
        dispatcher
            .into_router()
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The router, for embedding in a larger application or driving in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` resolves.
    ///
    /// ```no_run
    /// use route_crawler::http::server::shutdown_signal;
    /// use route_crawler::{crawl, AppConfig, HttpServer, RouteTable};
    ///
    /// # async fn serve(table: RouteTable) -> Result<(), Box<dyn std::error::Error>> {
    /// let config = AppConfig::default();
    /// let registrations = crawl(config.crawler.root.clone(), &table)?;
    /// let listener = tokio::net::TcpListener::bind(config.listener.bind_address.as_str()).await?;
    /// HttpServer::new(config, registrations)
    ///     .run(listener, shutdown_signal())
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Resolves on Ctrl+C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
