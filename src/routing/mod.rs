//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path, headers)
//!     → layer.rs (tower middleware, once per request)
//!     → module.rs (interceptor hook)
//!     → table.rs (first matching route, in order)
//!         → route.rs (pattern.rs + constraints, matcher.rs)
//!     → handler.rs (factory produces the handler)
//!     → context.rs (RequestContext attached to the request)
//!
//! Route Table Construction (at startup and on reload):
//!     RouteConfig[]
//!     → Parse patterns, compile constraints, look up handlers
//!     → Freeze as immutable RouteTable
//!     → Publish through SharedRouteTable (atomic swap)
//! ```
//!
//! # Design Decisions
//! - Routes built at startup, immutable at runtime
//! - Deterministic: same input always matches same route
//! - First match wins (registration order)
//! - Stop-routing is a handler variant, not a special factory

pub mod context;
pub mod error;
pub mod handler;
pub mod layer;
pub mod matcher;
pub mod module;
pub mod pattern;
pub mod route;
pub mod table;

pub use context::{RequestContext, RequestHead, RouteData};
pub use error::{ConfigurationError, RoutingError};
pub use handler::{HandlerFactory, HandlerRegistry, HttpHandler, RouteHandler, STOP_ROUTING};
pub use layer::{UrlRoutingLayer, UrlRoutingService};
pub use matcher::{HeaderMatcher, HostMatcher};
pub use module::{PipelineContext, RequestInterceptor, Resolution, UrlRoutingModule};
pub use pattern::{PatternError, RoutePattern, RouteValues};
pub use route::{Constraint, Route, RouteConstraint};
pub use table::{RouteTable, RouteTableError, SharedRouteTable};
