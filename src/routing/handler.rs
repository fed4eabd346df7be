//! Route handlers and handler factories.
//!
//! # Responsibilities
//! - Define the handler type installed for a routed request (`HttpHandler`)
//! - Define how a route produces that handler (`HandlerFactory`)
//! - Distinguish "produce a handler" from "stop routing" (`RouteHandler`)
//! - Map configuration names to handlers (`HandlerRegistry`)

use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use tower::util::BoxCloneSyncService;
use tower::Service;

use crate::routing::context::RequestContext;

/// Reserved handler name that maps to [`RouteHandler::StopRouting`].
pub const STOP_ROUTING: &str = "stop";

/// The handler that services a routed request.
pub type HttpHandler = BoxCloneSyncService<Request<Body>, Response, Infallible>;

/// Produces the handler for a request that matched a route.
///
/// Returning `None` is a configuration error: a route that should not be
/// handled must use [`RouteHandler::StopRouting`] instead.
pub trait HandlerFactory: Send + Sync {
    fn http_handler(&self, context: &RequestContext) -> Option<HttpHandler>;
}

impl<F> HandlerFactory for F
where
    F: Fn(&RequestContext) -> Option<HttpHandler> + Send + Sync,
{
    fn http_handler(&self, context: &RequestContext) -> Option<HttpHandler> {
        self(context)
    }
}

/// What a matched route does with the request.
#[derive(Clone)]
pub enum RouteHandler {
    /// Leave the request to the host's default resolution (e.g. static files).
    StopRouting,
    /// Build a handler for the request.
    Factory(Arc<dyn HandlerFactory>),
}

impl RouteHandler {
    pub fn factory<F>(factory: F) -> Self
    where
        F: HandlerFactory + 'static,
    {
        Self::Factory(Arc::new(factory))
    }

    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&RequestContext) -> Option<HttpHandler> + Send + Sync + 'static,
    {
        Self::Factory(Arc::new(f))
    }

    /// Every routed request gets a clone of `service`.
    pub fn service<S>(service: S) -> Self
    where
        S: Service<Request<Body>, Response = Response, Error = Infallible>
            + Clone
            + Send
            + Sync
            + 'static,
        S::Future: Send + 'static,
    {
        Self::factory(ServiceFactory(HttpHandler::new(service)))
    }

    pub fn is_stop_routing(&self) -> bool {
        matches!(self, Self::StopRouting)
    }
}

impl fmt::Debug for RouteHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StopRouting => f.write_str("StopRouting"),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

struct ServiceFactory(HttpHandler);

impl HandlerFactory for ServiceFactory {
    fn http_handler(&self, _context: &RequestContext) -> Option<HttpHandler> {
        Some(self.0.clone())
    }
}

/// Named route handlers, referenced from configuration.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, RouteHandler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under `name`, replacing any previous one.
    ///
    /// The reserved name `"stop"` always resolves to `StopRouting`.
    pub fn register(&mut self, name: impl Into<String>, handler: RouteHandler) -> &mut Self {
        let name = name.into();
        if name == STOP_ROUTING {
            tracing::warn!(name = %name, "Ignoring registration of reserved handler name");
        } else {
            self.handlers.insert(name, handler);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<RouteHandler> {
        if name == STOP_ROUTING {
            return Some(RouteHandler::StopRouting);
        }
        self.handlers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        name == STOP_ROUTING || self.handlers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}
