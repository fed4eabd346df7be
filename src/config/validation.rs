//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check route patterns, constraints, methods and headers compile
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Detect duplicate route names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RoutingConfig → Result<(), Vec<ValidationError>>
//! - Handler names are checked when the route table is built, since the
//!   registry is not part of the configuration

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue, Method};
use thiserror::Error;

use crate::config::schema::RoutingConfig;
use crate::routing::pattern::{PatternError, RoutePattern};
use crate::routing::route::compile_constraint;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid {field} '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,

    #[error("route #{index} ('{url}'): {source}")]
    InvalidPattern {
        index: usize,
        url: String,
        #[source]
        source: PatternError,
    },

    #[error("route #{index}: constraint on '{parameter}' is not a valid expression")]
    InvalidConstraint { index: usize, parameter: String },

    #[error("route #{index}: invalid HTTP method '{method}'")]
    InvalidMethod { index: usize, method: String },

    #[error("route #{index}: invalid header constraint '{name}'")]
    InvalidHeader { index: usize, name: String },

    #[error("duplicate route name '{0}'")]
    DuplicateRouteName(String),

    #[error("static_files.root must not be empty")]
    EmptyStaticRoot,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &RoutingConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if config.static_files.enabled && config.static_files.root.trim().is_empty() {
        errors.push(ValidationError::EmptyStaticRoot);
    }

    let mut names = HashSet::new();
    for (index, route) in config.routes.iter().enumerate() {
        if let Err(source) = RoutePattern::parse(&route.url) {
            errors.push(ValidationError::InvalidPattern {
                index,
                url: route.url.clone(),
                source,
            });
        }

        let mut parameters: Vec<&String> = route.constraints.keys().collect();
        parameters.sort();
        for parameter in parameters {
            if compile_constraint(&route.constraints[parameter]).is_err() {
                errors.push(ValidationError::InvalidConstraint {
                    index,
                    parameter: parameter.clone(),
                });
            }
        }

        for method in &route.methods {
            if method.to_ascii_uppercase().parse::<Method>().is_err() {
                errors.push(ValidationError::InvalidMethod {
                    index,
                    method: method.clone(),
                });
            }
        }

        let mut headers: Vec<(&String, &String)> = route.headers.iter().collect();
        headers.sort();
        for (name, value) in headers {
            if HeaderName::try_from(name.as_str()).is_err() || HeaderValue::try_from(value.as_str()).is_err() {
                errors.push(ValidationError::InvalidHeader {
                    index,
                    name: name.clone(),
                });
            }
        }

        if let Some(name) = &route.name {
            if !names.insert(name.as_str()) {
                errors.push(ValidationError::DuplicateRouteName(name.clone()));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
