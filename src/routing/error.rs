//! Routing errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// A matched route cannot service the request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("route '{route}' was selected but no handler factory is assigned to it")]
    MissingRouteHandler { route: String },

    #[error("the handler factory of route '{route}' produced no handler")]
    MissingHttpHandler { route: String },
}

/// Error raised while resolving a request to a handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("invalid argument: '{name}' is required")]
    InvalidArgument { name: &'static str },

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

impl RoutingError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::Configuration(ConfigurationError::MissingRouteHandler { .. }) => "missing_route_handler",
            Self::Configuration(ConfigurationError::MissingHttpHandler { .. }) => "missing_http_handler",
        }
    }
}

impl IntoResponse for RoutingError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}
