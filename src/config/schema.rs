//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the routing
//! server. All types derive Serde traits for deserialization from config files.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RoutingConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Route definitions, in match order.
    pub routes: Vec<RouteConfig>,

    /// Static file serving for requests no route handles.
    pub static_files: StaticFilesConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// A single route.
///
/// ```toml
/// [[routes]]
/// name = "user"
/// url = "/users/{id}"
/// handler = "route-values"
/// methods = ["GET"]
/// constraints = { id = "[0-9]+" }
/// headers = { "x-api-version" = "2" }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Optional unique name, used for URL generation and logging.
    #[serde(default)]
    pub name: Option<String>,

    /// URL pattern.
    pub url: String,

    /// Registered handler name; `"stop"` stops routing.
    #[serde(default)]
    pub handler: Option<String>,

    /// Host header to match (exact match, case-insensitive).
    #[serde(default)]
    pub host: Option<String>,

    /// Default values for parameters missing from the path.
    #[serde(default)]
    pub defaults: HashMap<String, String>,

    /// Regular expressions parameter values must match in full.
    #[serde(default)]
    pub constraints: HashMap<String, String>,

    /// Allowed HTTP methods (empty = any).
    #[serde(default)]
    pub methods: Vec<String>,

    /// Request headers that must be present with exactly these values.
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Values passed to the handler as-is.
    #[serde(default)]
    pub data_tokens: HashMap<String, String>,
}

/// Static file fallback.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Serve files for unrouted requests.
    pub enabled: bool,

    /// Directory to serve from.
    pub root: String,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            root: "public".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
