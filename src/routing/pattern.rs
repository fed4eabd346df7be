//! URL pattern parsing and matching.
//!
//! # Syntax
//! - Segments are separated by `/`; a leading or trailing `/` is ignored
//! - `{name}` captures a value; several may share a segment if literal text
//!   separates them (`{file}.{ext}`)
//! - `{*name}` captures the rest of the path; must be the whole, final segment
//! - `{{` and `}}` stand for literal braces
//!
//! # Design Decisions
//! - Literals compare ASCII case-insensitively
//! - Captured values are percent-decoded after the path is split, so `%2F`
//!   never acts as a separator
//! - Missing trailing segments match only when their parameters have defaults

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// Values bound while matching a route (captured parameters merged with defaults).
pub type RouteValues = HashMap<String, String>;

/// Error produced when a route pattern cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("route pattern must not contain a query string: {0}")]
    QueryString(String),

    #[error("route pattern contains an empty segment: {0}")]
    EmptySegment(String),

    #[error("unbalanced braces in segment '{0}'")]
    UnbalancedBraces(String),

    #[error("empty parameter name in segment '{0}'")]
    EmptyParameterName(String),

    #[error("parameter '{0}' appears more than once")]
    DuplicateParameter(String),

    #[error("catch-all parameter '{0}' must be the entire last segment")]
    MisplacedCatchAll(String),

    #[error("segment '{0}' has two parameters with no literal between them")]
    AdjacentParameters(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Param(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Parts(Vec<Part>),
    CatchAll(String),
}

/// A parsed route pattern such as `users/{id}` or `files/{*path}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
    params: Vec<String>,
}

impl RoutePattern {
    /// Parse a pattern string.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        if pattern.contains('?') {
            return Err(PatternError::QueryString(pattern.to_string()));
        }

        let trimmed = pattern.trim_start_matches('/').trim_end_matches('/');
        let raw_segments: Vec<&str> = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed.split('/').collect()
        };

        let mut segments = Vec::with_capacity(raw_segments.len());
        let mut params: Vec<String> = Vec::new();
        let last = raw_segments.len().saturating_sub(1);

        for (index, raw) in raw_segments.iter().enumerate() {
            if raw.is_empty() {
                return Err(PatternError::EmptySegment(pattern.to_string()));
            }

            let parts = parse_segment(raw)?;
            let mut catch_all = None;
            for part in &parts {
                if let Part::Param(name) = part {
                    let name = match name.strip_prefix('*') {
                        Some(rest) => {
                            if parts.len() != 1 || index != last {
                                return Err(PatternError::MisplacedCatchAll(rest.to_string()));
                            }
                            catch_all = Some(rest.to_string());
                            rest
                        }
                        None => name.as_str(),
                    };
                    if name.is_empty() {
                        return Err(PatternError::EmptyParameterName(raw.to_string()));
                    }
                    if params.iter().any(|p| p.eq_ignore_ascii_case(name)) {
                        return Err(PatternError::DuplicateParameter(name.to_string()));
                    }
                    params.push(name.to_string());
                }
            }

            segments.push(match catch_all {
                Some(name) => Segment::CatchAll(name),
                None => Segment::Parts(parts),
            });
        }

        Ok(Self {
            raw: pattern.to_string(),
            segments,
            params,
        })
    }

    /// The pattern as it was written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Parameter names in order of appearance (catch-all without its `*`).
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Match a request path, merging `defaults` into the result.
    ///
    /// Returns `None` if the path does not fit the pattern.
    pub fn matches(&self, path: &str, defaults: &RouteValues) -> Option<RouteValues> {
        let trimmed = path.trim_start_matches('/');
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
        let request: Vec<&str> = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed.split('/').collect()
        };

        let mut values = RouteValues::new();
        let mut consumed_all = false;

        for (index, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::CatchAll(name) => {
                    let rest = request.get(index..).unwrap_or(&[]);
                    if rest.is_empty() {
                        if let Some(default) = defaults.get(name) {
                            values.insert(name.clone(), default.clone());
                        }
                    } else {
                        if rest.iter().any(|s| s.is_empty()) {
                            return None;
                        }
                        let decoded: Vec<String> = rest.iter().map(|s| decode(s)).collect();
                        values.insert(name.clone(), decoded.join("/"));
                    }
                    consumed_all = true;
                }
                Segment::Parts(parts) => match request.get(index) {
                    Some(text) => {
                        if text.is_empty() {
                            return None;
                        }
                        let mut bound = Vec::new();
                        if !bind_parts(parts, text, &mut bound) {
                            return None;
                        }
                        values.extend(bound.into_iter().map(|(k, v)| (k, decode(&v))));
                    }
                    None => {
                        for part in parts {
                            match part {
                                Part::Literal(_) => return None,
                                Part::Param(name) => {
                                    let default = defaults.get(name)?;
                                    values.insert(name.clone(), default.clone());
                                }
                            }
                        }
                    }
                },
            }
        }

        if !consumed_all && request.len() > self.segments.len() {
            return None;
        }

        for (key, value) in defaults {
            values.entry(key.clone()).or_insert_with(|| value.clone());
        }
        Some(values)
    }

    /// Build a path from `values`, falling back to `defaults`.
    ///
    /// Trailing segments holding only a defaulted parameter are omitted.
    /// Returns `None` when a parameter has no value.
    pub fn build_path(&self, values: &RouteValues, defaults: &RouteValues) -> Option<String> {
        let mut built: Vec<(String, bool)> = Vec::with_capacity(self.segments.len());

        for segment in &self.segments {
            match segment {
                Segment::CatchAll(name) => {
                    let value = values.get(name).or_else(|| defaults.get(name));
                    let text = value
                        .map(|v| {
                            v.split('/')
                                .map(|piece| urlencoding::encode(piece).into_owned())
                                .collect::<Vec<_>>()
                                .join("/")
                        })
                        .unwrap_or_default();
                    let optional = text.is_empty() || is_default(name, values, defaults);
                    built.push((text, optional));
                }
                Segment::Parts(parts) => {
                    let mut text = String::new();
                    for part in parts {
                        match part {
                            Part::Literal(lit) => text.push_str(lit),
                            Part::Param(name) => {
                                let value = values.get(name).or_else(|| defaults.get(name))?;
                                text.push_str(&urlencoding::encode(value));
                            }
                        }
                    }
                    let optional = match parts.as_slice() {
                        [Part::Param(name)] => is_default(name, values, defaults),
                        _ => false,
                    };
                    built.push((text, optional));
                }
            }
        }

        while built.last().is_some_and(|(_, optional)| *optional) {
            built.pop();
        }

        let path: Vec<String> = built.into_iter().map(|(text, _)| text).collect();
        Some(format!("/{}", path.join("/")))
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl std::str::FromStr for RoutePattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn is_default(name: &str, values: &RouteValues, defaults: &RouteValues) -> bool {
    match (values.get(name), defaults.get(name)) {
        (None, Some(_)) => true,
        (Some(v), Some(d)) => v.eq_ignore_ascii_case(d),
        _ => false,
    }
}

fn decode(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|v| v.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

fn parse_segment(segment: &str) -> Result<Vec<Part>, PatternError> {
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut chars = segment.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                literal.push('{');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') | None => {
                            return Err(PatternError::UnbalancedBraces(segment.to_string()))
                        }
                        Some(ch) => name.push(ch),
                    }
                }
                if !literal.is_empty() {
                    parts.push(Part::Literal(std::mem::take(&mut literal)));
                }
                if matches!(parts.last(), Some(Part::Param(_))) {
                    return Err(PatternError::AdjacentParameters(segment.to_string()));
                }
                parts.push(Part::Param(name.trim().to_string()));
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                literal.push('}');
            }
            '}' => return Err(PatternError::UnbalancedBraces(segment.to_string())),
            _ => literal.push(c),
        }
    }

    if !literal.is_empty() {
        parts.push(Part::Literal(literal));
    }
    Ok(parts)
}

/// Bind the parts of one pattern segment against one request segment.
///
/// A parameter followed by a literal takes the longest value that still lets
/// the remainder bind.
fn bind_parts(parts: &[Part], text: &str, out: &mut Vec<(String, String)>) -> bool {
    match parts.split_first() {
        None => text.is_empty(),
        Some((Part::Literal(lit), rest)) => {
            if text.len() < lit.len() || !text.is_char_boundary(lit.len()) {
                return false;
            }
            let (head, tail) = text.split_at(lit.len());
            head.eq_ignore_ascii_case(lit) && bind_parts(rest, tail, out)
        }
        Some((Part::Param(name), rest)) => match rest.first() {
            None => {
                if text.is_empty() {
                    return false;
                }
                out.push((name.clone(), text.to_string()));
                true
            }
            Some(Part::Literal(lit)) => {
                let haystack = text.to_ascii_lowercase();
                let needle = lit.to_ascii_lowercase();
                let candidates: Vec<usize> = haystack
                    .match_indices(&needle)
                    .map(|(idx, _)| idx)
                    .filter(|idx| *idx > 0)
                    .collect();
                for idx in candidates.into_iter().rev() {
                    let mut nested = Vec::new();
                    if bind_parts(rest, &text[idx..], &mut nested) {
                        out.push((name.clone(), text[..idx].to_string()));
                        out.extend(nested);
                        return true;
                    }
                }
                false
            }
            Some(Part::Param(_)) => false,
        },
    }
}
