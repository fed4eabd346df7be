//! Per-request routing state.
//!
//! # Responsibilities
//! - `RequestHead`: borrowed view of the request used while matching
//! - `RouteData`: values bound by the winning route, plus a reference to it
//! - `RequestContext`: request head + route data, attached to the request
//!   extensions once a route handler has been installed
//!
//! # Design Decisions
//! - Matching borrows the request; only a routed request pays for cloning
//!   its head into an owned `RequestContext`
//! - Handlers recover the context with the `RequestContext` extractor

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, Method, Request, StatusCode, Uri};

use crate::routing::handler::RouteHandler;
use crate::routing::pattern::RouteValues;
use crate::routing::route::Route;

/// Borrowed view of the parts of a request that routing looks at.
#[derive(Debug, Clone, Copy)]
pub struct RequestHead<'a> {
    pub method: &'a Method,
    pub uri: &'a Uri,
    pub headers: &'a HeaderMap,
}

impl<'a> RequestHead<'a> {
    pub fn new(method: &'a Method, uri: &'a Uri, headers: &'a HeaderMap) -> Self {
        Self {
            method,
            uri,
            headers,
        }
    }

    pub fn from_request<B>(request: &'a Request<B>) -> Self {
        Self::new(request.method(), request.uri(), request.headers())
    }

    /// The path used for route matching.
    pub fn path(&self) -> &'a str {
        self.uri.path()
    }
}

/// Result of resolving a request against a route table.
#[derive(Debug, Clone)]
pub struct RouteData {
    route: Arc<Route>,
    values: RouteValues,
}

impl RouteData {
    pub fn new(route: Arc<Route>, values: RouteValues) -> Self {
        Self { route, values }
    }

    /// The route that produced this match.
    pub fn route(&self) -> &Arc<Route> {
        &self.route
    }

    /// Handler of the matched route, if one was assigned.
    pub fn route_handler(&self) -> Option<&RouteHandler> {
        self.route.handler()
    }

    /// Captured parameters merged with the route's defaults.
    pub fn values(&self) -> &RouteValues {
        &self.values
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn data_tokens(&self) -> &RouteValues {
        self.route.data_tokens()
    }

    pub fn data_token(&self, name: &str) -> Option<&str> {
        self.route.data_tokens().get(name).map(String::as_str)
    }
}

/// A routed request: its head plus the route data that selected its handler.
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    route_data: RouteData,
}

impl RequestContext {
    pub fn new(request: RequestHead<'_>, route_data: RouteData) -> Self {
        Self {
            method: request.method.clone(),
            uri: request.uri.clone(),
            headers: request.headers.clone(),
            route_data,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn route_data(&self) -> &RouteData {
        &self.route_data
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Request was not resolved by URL routing",
            ))
    }
}
