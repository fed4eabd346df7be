//! Request-level route constraints.
//!
//! # Responsibilities
//! - Match the Host header (exact match, case-insensitive, port ignored)
//! - Match an arbitrary header value
//!
//! # Design Decisions
//! - Host matching is case-insensitive (RFC 9110)
//! - Header values compare exactly
//! - A missing header never matches

use crate::routing::context::RequestHead;
use crate::routing::pattern::RouteValues;
use crate::routing::route::RouteConstraint;

/// Matches the Host header.
#[derive(Debug, Clone)]
pub struct HostMatcher {
    expected_host: String,
}

impl HostMatcher {
    /// The host is normalized to lowercase for case-insensitive matching.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            expected_host: host.into().to_lowercase(),
        }
    }
}

impl RouteConstraint for HostMatcher {
    fn matches(&self, request: &RequestHead<'_>, _parameter: &str, _values: &RouteValues) -> bool {
        request
            .headers
            .get("host")
            .and_then(|h| h.to_str().ok())
            .or_else(|| request.uri.authority().map(|a| a.as_str()))
            .map(|h| strip_port(h).eq_ignore_ascii_case(&self.expected_host))
            .unwrap_or(false)
    }
}

/// Matches a header value.
#[derive(Debug, Clone)]
pub struct HeaderMatcher {
    name: String,
    value: String,
}

impl HeaderMatcher {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl RouteConstraint for HeaderMatcher {
    fn matches(&self, request: &RequestHead<'_>, _parameter: &str, _values: &RouteValues) -> bool {
        request
            .headers
            .get_all(self.name.as_str())
            .iter()
            .any(|v| v.as_bytes() == self.value.as_bytes())
    }
}

fn strip_port(host: &str) -> &str {
    // Bracketed IPv6 literals keep their colons.
    if let Some(end) = host.find(']') {
        return &host[..=end];
    }
    host.rsplit_once(':').map_or(host, |(name, _)| name)
}
