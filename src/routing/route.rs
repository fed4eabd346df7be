//! Route definitions.
//!
//! A route pairs a URL pattern with the handler that services matching
//! requests, plus default values, constraints and data tokens. Routes are
//! built once, then shared read-only through the route table.

use std::fmt;
use std::sync::Arc;

use axum::http::Method;
use regex::{Regex, RegexBuilder};

use crate::routing::context::{RequestHead, RouteData};
use crate::routing::handler::RouteHandler;
use crate::routing::pattern::{PatternError, RoutePattern, RouteValues};

/// Custom check a matched route must pass before it is selected.
pub trait RouteConstraint: Send + Sync + fmt::Debug {
    /// `parameter` is the key the constraint was registered under.
    fn matches(&self, request: &RequestHead<'_>, parameter: &str, values: &RouteValues) -> bool;
}

/// A constraint attached to a route parameter.
#[derive(Debug, Clone)]
pub enum Constraint {
    /// The parameter value must match the expression in full (case-insensitive).
    Pattern(Regex),
    /// The request method must be one of these.
    Methods(Vec<Method>),
    Custom(Arc<dyn RouteConstraint>),
}

impl Constraint {
    /// Compile a value constraint. The expression is anchored on both ends.
    pub fn regex(expr: &str) -> Result<Self, regex::Error> {
        compile_constraint(expr).map(Self::Pattern)
    }

    pub fn methods(methods: impl IntoIterator<Item = Method>) -> Self {
        Self::Methods(methods.into_iter().collect())
    }

    pub fn custom(constraint: impl RouteConstraint + 'static) -> Self {
        Self::Custom(Arc::new(constraint))
    }

    fn check(&self, request: Option<&RequestHead<'_>>, parameter: &str, values: &RouteValues) -> bool {
        match (self, request) {
            (Self::Pattern(re), _) => re.is_match(values.get(parameter).map_or("", String::as_str)),
            (Self::Methods(methods), Some(request)) => methods.contains(request.method),
            (Self::Custom(custom), Some(request)) => custom.matches(request, parameter, values),
            // Request-dependent constraints don't apply to URL generation.
            (_, None) => true,
        }
    }
}

/// Compile `expr` so that it must match a whole value, ignoring case.
///
/// The bare expression is compiled first: one that is not balanced on its
/// own could otherwise close the anchoring group.
pub fn compile_constraint(expr: &str) -> Result<Regex, regex::Error> {
    Regex::new(expr)?;
    RegexBuilder::new(&format!("^(?:{expr})$"))
        .case_insensitive(true)
        .build()
}

/// An immutable route definition.
#[derive(Debug, Clone)]
pub struct Route {
    name: Option<String>,
    pattern: RoutePattern,
    handler: Option<RouteHandler>,
    defaults: RouteValues,
    constraints: Vec<(String, Constraint)>,
    data_tokens: RouteValues,
}

impl Route {
    /// Create a route from a pattern string.
    pub fn new(pattern: &str, handler: RouteHandler) -> Result<Self, PatternError> {
        Ok(Self::from_pattern(RoutePattern::parse(pattern)?, Some(handler)))
    }

    /// A route with no handler assigned.
    ///
    /// Resolving a request to it is reported as a configuration error.
    pub fn unhandled(pattern: &str) -> Result<Self, PatternError> {
        Ok(Self::from_pattern(RoutePattern::parse(pattern)?, None))
    }

    pub fn from_pattern(pattern: RoutePattern, handler: Option<RouteHandler>) -> Self {
        Self {
            name: None,
            pattern,
            handler,
            defaults: RouteValues::new(),
            constraints: Vec::new(),
            data_tokens: RouteValues::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub(crate) fn without_name(mut self) -> Self {
        self.name = None;
        self
    }

    pub fn with_default(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.insert(key.into(), value.into());
        self
    }

    pub fn with_defaults(mut self, defaults: RouteValues) -> Self {
        self.defaults.extend(defaults);
        self
    }

    pub fn with_constraint(mut self, parameter: impl Into<String>, constraint: Constraint) -> Self {
        self.constraints.push((parameter.into(), constraint));
        self
    }

    pub fn with_data_token(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data_tokens.insert(key.into(), value.into());
        self
    }

    pub fn with_data_tokens(mut self, tokens: RouteValues) -> Self {
        self.data_tokens.extend(tokens);
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name if set, pattern otherwise. Used in logs and errors.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.pattern.as_str())
    }

    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    pub fn handler(&self) -> Option<&RouteHandler> {
        self.handler.as_ref()
    }

    pub fn defaults(&self) -> &RouteValues {
        &self.defaults
    }

    pub fn constraints(&self) -> &[(String, Constraint)] {
        &self.constraints
    }

    pub fn data_tokens(&self) -> &RouteValues {
        &self.data_tokens
    }

    /// Match the request against this route.
    pub fn route_data(self: &Arc<Self>, request: &RequestHead<'_>) -> Option<RouteData> {
        let values = self.pattern.matches(request.path(), &self.defaults)?;
        let accepted = self
            .constraints
            .iter()
            .all(|(parameter, constraint)| constraint.check(Some(request), parameter, &values));
        accepted.then(|| RouteData::new(Arc::clone(self), values))
    }

    /// Generate a path for `values`, or `None` if this route cannot produce one.
    pub fn url_for(&self, values: &RouteValues) -> Option<String> {
        let mut merged = self.defaults.clone();
        merged.extend(values.iter().map(|(k, v)| (k.clone(), v.clone())));

        // Values for keys the pattern can't carry must agree with the defaults.
        let consistent = self
            .defaults
            .iter()
            .filter(|(key, _)| !self.pattern.params().contains(*key))
            .all(|(key, default)| values.get(key).map_or(true, |v| v.eq_ignore_ascii_case(default)));
        if !consistent {
            return None;
        }

        let accepted = self
            .constraints
            .iter()
            .all(|(parameter, constraint)| constraint.check(None, parameter, &merged));
        if !accepted {
            return None;
        }

        self.pattern.build_path(values, &self.defaults)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, Uri};

    fn head<'a>(method: &'a Method, uri: &'a Uri, headers: &'a HeaderMap) -> RequestHead<'a> {
        RequestHead::new(method, uri, headers)
    }

    #[derive(Debug)]
    struct RequireHeader(&'static str);

    impl RouteConstraint for RequireHeader {
        fn matches(&self, request: &RequestHead<'_>, _parameter: &str, _values: &RouteValues) -> bool {
            request.headers.contains_key(self.0)
        }
    }

    #[test]
    fn test_regex_constraint() {
        let route = Arc::new(
            Route::unhandled("/users/{id}")
                .unwrap()
                .with_constraint("id", Constraint::regex(r"\d+").unwrap()),
        );
        let headers = HeaderMap::new();

        let uri: Uri = "/users/42".parse().unwrap();
        let data = route.route_data(&head(&Method::GET, &uri, &headers)).unwrap();
        assert_eq!(data.value("id"), Some("42"));

        let uri: Uri = "/users/new".parse().unwrap();
        assert!(route.route_data(&head(&Method::GET, &uri, &headers)).is_none());

        // Anchored: partial matches are rejected.
        let uri: Uri = "/users/42a".parse().unwrap();
        assert!(route.route_data(&head(&Method::GET, &uri, &headers)).is_none());
    }

    #[test]
    fn test_regex_constraint_cannot_escape_anchor() {
        assert!(Constraint::regex("a)|(?:b").is_err());
        assert!(compile_constraint("(").is_err());

        let re = compile_constraint("a|b").unwrap();
        assert!(re.is_match("A"));
        assert!(!re.is_match("azzzz"));
        assert!(!re.is_match("ab"));
    }

    #[test]
    fn test_method_constraint() {
        let route = Arc::new(
            Route::unhandled("/items")
                .unwrap()
                .with_constraint("httpMethod", Constraint::methods([Method::POST])),
        );
        let uri: Uri = "/items".parse().unwrap();
        let headers = HeaderMap::new();

        assert!(route.route_data(&head(&Method::POST, &uri, &headers)).is_some());
        assert!(route.route_data(&head(&Method::GET, &uri, &headers)).is_none());
    }

    #[test]
    fn test_custom_constraint() {
        let route = Arc::new(
            Route::unhandled("/admin")
                .unwrap()
                .with_constraint("auth", Constraint::custom(RequireHeader("authorization"))),
        );
        let uri: Uri = "/admin".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert!(route.route_data(&head(&Method::GET, &uri, &headers)).is_none());

        headers.insert("authorization", "Bearer x".parse().unwrap());
        assert!(route.route_data(&head(&Method::GET, &uri, &headers)).is_some());
    }

    #[test]
    fn test_data_tokens_are_exposed() {
        let route = Arc::new(
            Route::unhandled("/legacy")
                .unwrap()
                .with_data_token("area", "old"),
        );
        let uri: Uri = "/legacy".parse().unwrap();
        let headers = HeaderMap::new();
        let data = route.route_data(&head(&Method::GET, &uri, &headers)).unwrap();
        assert_eq!(data.data_token("area"), Some("old"));
        assert!(data.values().is_empty());
    }

    #[test]
    fn test_url_for() {
        let route = Route::unhandled("/users/{id}")
            .unwrap()
            .with_default("area", "people")
            .with_constraint("id", Constraint::regex(r"\d+").unwrap());

        let mut values = RouteValues::new();
        values.insert("id".into(), "7".into());
        assert_eq!(route.url_for(&values).as_deref(), Some("/users/7"));

        values.insert("id".into(), "abc".into());
        assert!(route.url_for(&values).is_none());

        values.insert("id".into(), "7".into());
        values.insert("area".into(), "other".into());
        assert!(route.url_for(&values).is_none());
    }

    #[test]
    fn test_display_name() {
        let route = Route::unhandled("/a/{b}").unwrap();
        assert_eq!(route.display_name(), "/a/{b}");
        assert_eq!(route.with_name("a").display_name(), "a");
    }
}
