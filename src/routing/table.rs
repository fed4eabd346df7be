//! The ordered route table.
//!
//! # Responsibilities
//! - Hold routes in registration order
//! - Resolve a request to the first matching route
//! - Generate URLs from route values
//! - Publish whole-table replacements to in-flight readers
//!
//! # Design Decisions
//! - Immutable once shared (thread-safe without locks)
//! - First match wins; identical patterns are allowed
//! - Reconfiguration swaps the entire table; a resolution always sees one
//!   consistent snapshot

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::http::Method;
use thiserror::Error;

use crate::config::RouteConfig;
use crate::routing::context::{RequestHead, RouteData};
use crate::routing::handler::{HandlerRegistry, RouteHandler};
use crate::routing::matcher::{HeaderMatcher, HostMatcher};
use crate::routing::pattern::{PatternError, RoutePattern, RouteValues};
use crate::routing::route::{Constraint, Route};

/// Parameter key under which configured HTTP method constraints are stored.
pub const HTTP_METHOD_CONSTRAINT: &str = "httpMethod";

/// Parameter key under which configured host constraints are stored.
pub const HOST_CONSTRAINT: &str = "host";

/// Prefix of the parameter keys under which configured header constraints
/// are stored, followed by the header name.
pub const HEADER_CONSTRAINT_PREFIX: &str = "header:";

/// Error building or extending a route table.
#[derive(Debug, Error)]
pub enum RouteTableError {
    #[error("a route named '{0}' is already registered")]
    DuplicateName(String),

    #[error("route '{route}': {source}")]
    Pattern {
        route: String,
        #[source]
        source: PatternError,
    },

    #[error("route '{route}': invalid constraint on '{parameter}': {source}")]
    Constraint {
        route: String,
        parameter: String,
        #[source]
        source: regex::Error,
    },

    #[error("route '{route}': invalid HTTP method '{method}'")]
    Method { route: String, method: String },

    #[error("route '{route}': no handler registered as '{handler}'")]
    UnknownHandler { route: String, handler: String },
}

/// Ordered collection of routes.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Arc<Route>>,
    names: HashMap<String, usize>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from configuration, resolving handler names through `registry`.
    ///
    /// Routes keep their configured order. A route with no `handler` entry is
    /// kept without one.
    pub fn from_config(configs: &[RouteConfig], registry: &HandlerRegistry) -> Result<Self, RouteTableError> {
        let mut table = Self::new();

        for config in configs {
            let label = config.name.clone().unwrap_or_else(|| config.url.clone());

            let pattern = RoutePattern::parse(&config.url).map_err(|source| RouteTableError::Pattern {
                route: label.clone(),
                source,
            })?;

            let handler = match &config.handler {
                Some(name) => Some(registry.get(name).ok_or_else(|| RouteTableError::UnknownHandler {
                    route: label.clone(),
                    handler: name.clone(),
                })?),
                None => None,
            };

            let mut route = Route::from_pattern(pattern, handler)
                .with_defaults(config.defaults.clone())
                .with_data_tokens(config.data_tokens.clone());

            for (parameter, expr) in &config.constraints {
                let constraint = Constraint::regex(expr).map_err(|source| RouteTableError::Constraint {
                    route: label.clone(),
                    parameter: parameter.clone(),
                    source,
                })?;
                route = route.with_constraint(parameter.clone(), constraint);
            }

            if let Some(host) = &config.host {
                route = route.with_constraint(HOST_CONSTRAINT, Constraint::custom(HostMatcher::new(host.clone())));
            }

            let mut headers: Vec<(&String, &String)> = config.headers.iter().collect();
            headers.sort();
            for (name, value) in headers {
                route = route.with_constraint(
                    format!("{HEADER_CONSTRAINT_PREFIX}{}", name.to_ascii_lowercase()),
                    Constraint::custom(HeaderMatcher::new(name.to_ascii_lowercase(), value.clone())),
                );
            }

            if !config.methods.is_empty() {
                let methods = config
                    .methods
                    .iter()
                    .map(|m| {
                        m.to_ascii_uppercase().parse::<Method>().map_err(|_| RouteTableError::Method {
                            route: label.clone(),
                            method: m.clone(),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                route = route.with_constraint(HTTP_METHOD_CONSTRAINT, Constraint::methods(methods));
            }

            match &config.name {
                Some(name) => table.add_named(name.clone(), route)?,
                None => table.add(route),
            }
        }

        tracing::debug!(routes = table.len(), "Route table built from configuration");
        Ok(table)
    }

    /// Append a route. It is matched after every route already present.
    ///
    /// A route whose name is already registered is added unnamed, so that
    /// name lookup and request resolution keep agreeing on the first route.
    pub fn add(&mut self, mut route: Route) {
        match route.name().map(str::to_string) {
            Some(name) if self.names.contains_key(&name) => {
                tracing::warn!(
                    name = %name,
                    pattern = %route.pattern(),
                    "Route name already registered, adding route unnamed"
                );
                route = route.without_name();
            }
            Some(name) => {
                self.names.insert(name, self.routes.len());
            }
            None => {}
        }
        self.routes.push(Arc::new(route));
    }

    /// Append a route under a unique name.
    pub fn add_named(&mut self, name: impl Into<String>, route: Route) -> Result<(), RouteTableError> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(RouteTableError::DuplicateName(name));
        }
        self.add(route.with_name(name));
        Ok(())
    }

    /// Append a route that stops routing for matching requests, leaving them
    /// to the host's default handling.
    pub fn ignore(&mut self, pattern: &str) -> Result<(), RouteTableError> {
        let route = Route::new(pattern, RouteHandler::StopRouting).map_err(|source| RouteTableError::Pattern {
            route: pattern.to_string(),
            source,
        })?;
        self.add(route);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Route>> {
        self.names.get(name).and_then(|&index| self.routes.get(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Find the first route matching the request, in registration order.
    pub fn resolve(&self, request: &RequestHead<'_>) -> Option<RouteData> {
        let found = self.routes.iter().find_map(|route| route.route_data(request));
        tracing::trace!(
            path = %request.path(),
            route = found.as_ref().map(|data| data.route().display_name()),
            "Route lookup"
        );
        found
    }

    /// Generate a path from `values`.
    ///
    /// With a name, only that route is considered; otherwise the first route
    /// able to produce a path wins. Stop-routing routes never generate URLs.
    pub fn url_for(&self, name: Option<&str>, values: &RouteValues) -> Option<String> {
        match name {
            Some(name) => self.get(name)?.url_for(values),
            None => self
                .routes
                .iter()
                .filter(|route| !route.handler().is_some_and(RouteHandler::is_stop_routing))
                .find_map(|route| route.url_for(values)),
        }
    }
}

/// A route table that can be replaced while requests are being served.
///
/// Readers take a [`snapshot`](Self::snapshot) per request; writers publish a
/// complete new table with [`replace`](Self::replace).
#[derive(Debug, Clone)]
pub struct SharedRouteTable {
    inner: Arc<ArcSwap<RouteTable>>,
}

impl SharedRouteTable {
    pub fn new(table: RouteTable) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(table)),
        }
    }

    pub fn snapshot(&self) -> Arc<RouteTable> {
        self.inner.load_full()
    }

    pub fn replace(&self, table: RouteTable) {
        let routes = table.len();
        self.inner.store(Arc::new(table));
        tracing::info!(routes, "Route table replaced");
    }
}

impl From<RouteTable> for SharedRouteTable {
    fn from(table: RouteTable) -> Self {
        Self::new(table)
    }
}
