//! The URL routing interceptor.
//!
//! # Data Flow
//! ```text
//! Host pipeline (default handler already chosen)
//!     → post_resolve_request_cache(context)
//!     → route table snapshot → resolve(request)
//!         no match          → leave the default handler in place
//!         stop-routing      → leave the default handler in place
//!         handler factory   → build RequestContext → factory.http_handler()
//!                           → attach RequestContext, remap handler
//! ```
//!
//! # Design Decisions
//! - Resolution is synchronous and runs exactly once per request
//! - A stop-routing match short-circuits before any handler is built
//! - Misconfigured routes are errors, never silent fall-through

use crate::observability::metrics;
use crate::routing::context::{RequestContext, RequestHead};
use crate::routing::error::{ConfigurationError, RoutingError};
use crate::routing::handler::{HttpHandler, RouteHandler};
use crate::routing::table::SharedRouteTable;

/// The host pipeline as seen by an interceptor.
pub trait PipelineContext {
    /// The request being processed.
    fn request(&self) -> RequestHead<'_>;

    /// Make the routing result available to later stages and the handler.
    fn set_request_context(&mut self, context: RequestContext);

    /// Replace the handler that will service the request.
    fn remap_handler(&mut self, handler: HttpHandler);
}

/// Terminal state of a resolution that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// No route matched; the default handler stays.
    NoMatch,
    /// A stop-routing route matched; the default handler stays.
    Suppressed,
    /// A route handler was installed.
    Routed,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoMatch => "no_match",
            Self::Suppressed => "suppressed",
            Self::Routed => "routed",
        }
    }
}

/// Pipeline hooks an interceptor is invoked at.
pub trait RequestInterceptor: Send + Sync {
    /// Runs after the host has resolved the request from its cache.
    fn post_resolve_request_cache<C>(&self, context: Option<&mut C>) -> Result<Resolution, RoutingError>
    where
        C: PipelineContext + ?Sized;

    /// Runs after the host has mapped its own handler. Does nothing.
    #[deprecated(note = "routing happens in `post_resolve_request_cache`")]
    fn post_map_request_handler<C>(&self, _context: Option<&mut C>)
    where
        C: PipelineContext + ?Sized,
    {
    }
}

/// Resolves requests against a route table and installs the route's handler.
#[derive(Debug, Clone)]
pub struct UrlRoutingModule {
    routes: SharedRouteTable,
}

impl UrlRoutingModule {
    pub fn new(routes: impl Into<SharedRouteTable>) -> Self {
        Self { routes: routes.into() }
    }

    pub fn routes(&self) -> &SharedRouteTable {
        &self.routes
    }

    fn resolve<C>(&self, context: &mut C) -> Result<Resolution, RoutingError>
    where
        C: PipelineContext + ?Sized,
    {
        let routes = self.routes.snapshot();
        let Some(route_data) = routes.resolve(&context.request()) else {
            tracing::debug!(path = %context.request().path(), "No route matched");
            return Ok(Resolution::NoMatch);
        };

        let route = route_data.route().display_name().to_string();
        let factory = match route_data.route_handler() {
            None => return Err(ConfigurationError::MissingRouteHandler { route }.into()),
            Some(RouteHandler::StopRouting) => {
                tracing::debug!(route = %route, "Routing stopped by route");
                return Ok(Resolution::Suppressed);
            }
            Some(RouteHandler::Factory(factory)) => factory.clone(),
        };

        let request_context = RequestContext::new(context.request(), route_data);
        let handler = factory
            .http_handler(&request_context)
            .ok_or_else(|| ConfigurationError::MissingHttpHandler { route: route.clone() })?;

        tracing::debug!(
            route = %route,
            values = ?request_context.route_data().values(),
            "Request routed"
        );
        context.set_request_context(request_context);
        context.remap_handler(handler);
        Ok(Resolution::Routed)
    }
}

impl RequestInterceptor for UrlRoutingModule {
    fn post_resolve_request_cache<C>(&self, context: Option<&mut C>) -> Result<Resolution, RoutingError>
    where
        C: PipelineContext + ?Sized,
    {
        let result = context
            .ok_or(RoutingError::InvalidArgument { name: "context" })
            .and_then(|context| self.resolve(context));
        match &result {
            Ok(resolution) => metrics::record_resolution(resolution.as_str()),
            Err(err) => metrics::record_routing_error(err.kind()),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::table::RouteTable;
    use ::metrics::{Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit};
    use std::sync::Mutex;

    /// Remembers every counter registered as `name{label=value}`.
    #[derive(Default)]
    struct CountersSeen(Mutex<Vec<String>>);

    impl Recorder for CountersSeen {
        fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

        fn register_counter(&self, key: &Key, _: &Metadata<'_>) -> Counter {
            let labels: Vec<String> = key
                .labels()
                .map(|label| format!("{}={}", label.key(), label.value()))
                .collect();
            self.0
                .lock()
                .unwrap()
                .push(format!("{}{{{}}}", key.name(), labels.join(",")));
            Counter::noop()
        }

        fn register_gauge(&self, _: &Key, _: &Metadata<'_>) -> Gauge {
            Gauge::noop()
        }

        fn register_histogram(&self, _: &Key, _: &Metadata<'_>) -> Histogram {
            Histogram::noop()
        }
    }

    #[test]
    fn test_invalid_argument_is_counted() {
        let module = UrlRoutingModule::new(RouteTable::new());
        let recorder = CountersSeen::default();

        let result = ::metrics::with_local_recorder(&recorder, || {
            module.post_resolve_request_cache::<dyn PipelineContext>(None)
        });

        assert_eq!(result, Err(RoutingError::InvalidArgument { name: "context" }));
        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec!["routing_errors_total{kind=invalid_argument}".to_string()]
        );
    }
}
