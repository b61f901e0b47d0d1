//! Route composition.
//!
//! # Data Flow
//! ```text
//! RouteOptions (handlers + policy, optionally seeded from RouteDefaults)
//!     → Route::new (environment read once: suppressed or not)
//!     → Route::register(verb, path)
//!         → cors.rs (preflight + prepended middleware)
//!         → auth.rs / adapter.rs (normalize every handler)
//!         → Registration (ordered layers for the dispatcher)
//!
//! Route::invoke_direct (invoke.rs)
//!     → same handlers, sequential, no transport
//! ```
//!
//! # Design Decisions
//! - Suppression is decided at construction and never re-evaluated
//! - A suppressed route registers nothing, whatever else it is configured with
//! - Handler shape is declared by the caller (`Handler::continuation` / `Handler::deferred`)

pub mod adapter;
pub mod auth;
pub mod cors;
pub mod handler;
pub mod invoke;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::config::schema::{CorsConfig, Disallowed, RouteDefaults};
use crate::error::RouteError;
use crate::http::dispatch::Registration;
use crate::routing::matcher::MethodMatcher;
use crate::routing::verb::Verb;

pub use adapter::adapt;
pub use auth::{gate, Authenticator, SessionAuthenticator};
pub use cors::Cors;
pub use handler::{Handler, HandlerResult, Middleware, Next};

/// Everything needed to build a [`Route`].
#[derive(Clone)]
pub struct RouteOptions {
    handlers: Vec<Handler>,
    require_authentication: bool,
    wildcard: bool,
    skipped_handler: Option<Handler>,
    cors: Option<CorsConfig>,
    suppress: BTreeMap<String, Disallowed>,
    authenticator: Arc<dyn Authenticator>,
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            handlers: Vec::new(),
            require_authentication: false,
            wildcard: false,
            skipped_handler: None,
            cors: None,
            suppress: BTreeMap::new(),
            authenticator: Arc::new(SessionAuthenticator),
        }
    }
}

impl RouteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from application-wide defaults.
    pub fn from_defaults(defaults: &RouteDefaults) -> Self {
        Self {
            require_authentication: defaults.require_authentication,
            wildcard: defaults.wildcard,
            cors: defaults.cors.clone(),
            suppress: defaults.suppress.clone(),
            ..Self::default()
        }
    }

    pub fn handler(mut self, handler: Handler) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn require_authentication(mut self, required: bool) -> Self {
        self.require_authentication = required;
        self
    }

    pub fn wildcard(mut self, wildcard: bool) -> Self {
        self.wildcard = wildcard;
        self
    }

    /// Invoked instead of the chain when authentication is required but absent.
    pub fn skipped_handler(mut self, handler: Handler) -> Self {
        self.skipped_handler = Some(handler);
        self
    }

    pub fn cors(mut self, cors: CorsConfig) -> Self {
        self.cors = Some(cors);
        self
    }

    /// Suppress the route when `var` holds one of `values`.
    ///
    /// Entries are checked in variable-name order, not call order.
    pub fn suppress_when(mut self, var: impl Into<String>, values: impl Into<Disallowed>) -> Self {
        self.suppress.insert(var.into(), values.into());
        self
    }

    pub fn authenticator(mut self, authenticator: impl Authenticator + 'static) -> Self {
        self.authenticator = Arc::new(authenticator);
        self
    }
}

/// One verb's handling at one path: an ordered handler chain plus its policy.
#[derive(Clone)]
pub struct Route {
    handlers: Vec<Handler>,
    require_authentication: bool,
    wildcard: bool,
    skipped_handler: Option<Handler>,
    cors: Option<CorsConfig>,
    authenticator: Arc<dyn Authenticator>,
    suppressed: bool,
}

impl Route {
    /// Build a route, reading the process environment for suppression.
    pub fn new(options: RouteOptions) -> Self {
        Self::with_env(options, |name| std::env::var(name).ok())
    }

    /// Build a route with an explicit environment lookup.
    pub fn with_env(options: RouteOptions, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let suppressed = is_suppressed(&options.suppress, lookup);

        Self {
            handlers: options.handlers,
            require_authentication: options.require_authentication,
            wildcard: options.wildcard,
            skipped_handler: options.skipped_handler,
            cors: options.cors,
            authenticator: options.authenticator,
            suppressed,
        }
    }

    /// A route with a single handler and default options.
    pub fn single(handler: Handler) -> Self {
        Self::new(RouteOptions::new().handler(handler))
    }

    /// Append a handler to the end of the chain.
    pub fn push(&mut self, handler: Handler) {
        self.handlers.push(handler);
    }

    /// Append every handler of `other`, keeping this route's policy.
    pub fn extend_from(&mut self, other: &Route) {
        self.handlers.extend(other.handlers.iter().cloned());
    }

    pub fn handlers(&self) -> &[Handler] {
        &self.handlers
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    pub fn requires_authentication(&self) -> bool {
        self.require_authentication
    }

    /// The path actually registered for `path`.
    pub fn effective_path(&self, path: &str) -> String {
        if self.wildcard {
            format!("{}*", path.strip_suffix('/').unwrap_or(path))
        } else {
            path.to_string()
        }
    }

    /// Build the transport registration for `verb` at `path`.
    ///
    /// Fails only when a handler cannot be composed.
    pub fn register(&self, verb: Verb, path: &str) -> Result<Registration, RouteError> {
        let mut registration = Registration::new();
        if self.suppressed {
            return Ok(registration);
        }

        let path = self.effective_path(path);
        let cors = self.cors.as_ref().map(Cors::from_config).transpose()?;

        if let Some(cors) = &cors {
            registration.on(MethodMatcher::Only(axum::http::Method::OPTIONS), &path, vec![cors.preflight()]);
        }

        for handler in &self.handlers {
            let normalized = if self.require_authentication {
                gate(handler, self.skipped_handler.as_ref(), Arc::clone(&self.authenticator))?
            } else {
                adapt(handler)?
            };

            let mut chain = Vec::with_capacity(2);
            if let Some(cors) = &cors {
                chain.push(cors.middleware());
            }
            chain.push(normalized);
            registration.on(verb, &path, chain);
        }

        Ok(registration)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("handlers", &self.handlers)
            .field("require_authentication", &self.require_authentication)
            .field("wildcard", &self.wildcard)
            .field("skipped_handler", &self.skipped_handler)
            .field("cors", &self.cors)
            .field("suppressed", &self.suppressed)
            .finish()
    }
}

/// Entries are checked in variable-name order and the first match wins.
/// Unset or empty variables never match.
fn is_suppressed(
    suppress: &BTreeMap<String, Disallowed>,
    lookup: impl Fn(&str) -> Option<String>,
) -> bool {
    suppress.iter().any(|(name, disallowed)| {
        lookup(name).is_some_and(|value| !value.is_empty() && disallowed.contains(&value))
    })
}
