//! Built-in route handlers.
//!
//! - `route-values`: responds with the route's values and data tokens as JSON
//! - `redirect`: redirects to the `redirect_to` data token, with `{param}`
//!   placeholders filled from the route values; status from `redirect_status`
//!   (default 302)

use std::convert::Infallible;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use tower::service_fn;

use crate::routing::{HandlerRegistry, HttpHandler, RequestContext, RouteHandler, RouteValues};

pub const ROUTE_VALUES: &str = "route-values";
pub const REDIRECT: &str = "redirect";

/// Registry holding every built-in handler.
pub fn default_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry
        .register(ROUTE_VALUES, route_values())
        .register(REDIRECT, redirect());
    registry
}

pub fn route_values() -> RouteHandler {
    RouteHandler::from_fn(|context: &RequestContext| {
        let data = context.route_data();
        let body = json!({
            "route": data.route().display_name(),
            "method": context.method().as_str(),
            "path": context.uri().path(),
            "values": data.values(),
            "data_tokens": data.data_tokens(),
        });
        Some(HttpHandler::new(service_fn(move |_req: Request<Body>| {
            let body = body.clone();
            async move { Ok::<_, Infallible>(Json(body).into_response()) }
        })))
    })
}

/// Produces no handler when the route has no `redirect_to` token or an
/// unusable `redirect_status`.
pub fn redirect() -> RouteHandler {
    RouteHandler::from_fn(|context: &RequestContext| {
        let data = context.route_data();
        let target = expand(data.data_token("redirect_to")?, data.values());
        let status = match data.data_token("redirect_status") {
            Some(code) => code
                .parse::<u16>()
                .ok()
                .and_then(|code| StatusCode::from_u16(code).ok())
                .filter(StatusCode::is_redirection)?,
            None => StatusCode::FOUND,
        };

        Some(HttpHandler::new(service_fn(move |_req: Request<Body>| {
            let target = target.clone();
            async move { Ok::<_, Infallible>((status, [(header::LOCATION, target)]).into_response()) }
        })))
    })
}

/// Replace `{name}` placeholders with route values.
fn expand(template: &str, values: &RouteValues) -> String {
    values.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{key}}}"), value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand() {
        let mut values = RouteValues::new();
        values.insert("slug".into(), "hello".into());
        assert_eq!(expand("/articles/{slug}", &values), "/articles/hello");
        assert_eq!(expand("/static", &values), "/static");
    }

    #[test]
    fn test_default_registry() {
        let registry = default_registry();
        assert!(registry.contains(ROUTE_VALUES));
        assert!(registry.contains(REDIRECT));
        assert!(registry.get("stop").unwrap().is_stop_routing());
    }
}
