//! URL routing for axum/tower HTTP services.
//!
//! Resolves each request against an ordered route table and, when a route
//! matches, replaces the service's default handler with the one the route's
//! handler factory produces.

pub mod config;
pub mod handlers;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::RoutingConfig;
pub use http::RoutingServer;
pub use lifecycle::Shutdown;
pub use routing::{RouteTable, UrlRoutingLayer, UrlRoutingModule};
