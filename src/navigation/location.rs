//! Location codec.
//!
//! # Responsibilities
//! - Accept a location as a path string or a structured value
//! - Split `path?k=v&k2=v2` into the path and its query params
//! - Resolve relative locations against the previously set one
//!
//! # Design Decisions
//! - Query params are never matched against route patterns
//! - When there is no `?` but there is an `&`, the `&` starts the query
//! - Values stay raw: nothing is percent-decoded
//! - Relative resolution uses directory-stack semantics on the previous
//!   location with its final segment dropped

use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;

use crate::routing::types::MatchParams;

/// A location as supplied by the outside world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// `posts/1?tab=comments`
    Path(String),
    /// A route plus auxiliary params that overlay any query in `route`.
    Structured {
        route: String,
        params: Vec<(String, String)>,
    },
}

/// Errors converting a JSON value into a [`Location`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocationError {
    #[error("location object has no string 'route' key")]
    MissingRoute,

    #[error("unsupported location value: {0}")]
    Unsupported(String),

    #[error("invalid location JSON: {0}")]
    Json(String),
}

impl Location {
    /// Start a structured location.
    pub fn structured(route: impl Into<String>) -> Self {
        Self::Structured {
            route: route.into(),
            params: Vec::new(),
        }
    }

    /// Add an auxiliary param. Non-structured locations are converted.
    pub fn param(self, key: impl Into<String>, value: impl ToString) -> Self {
        let (route, mut params) = match self {
            Self::Path(route) => (route, Vec::new()),
            Self::Structured { route, params } => (route, params),
        };
        params.push((key.into(), value.to_string()));
        Self::Structured { route, params }
    }

    /// Serialize to a single path string, params as a `?` suffix.
    pub fn encode(&self) -> String {
        match self {
            Self::Path(path) => path.clone(),
            Self::Structured { route, params } => {
                let (path, mut query) = split_query(route);
                for (key, value) in params {
                    overlay(&mut query, key, value);
                }
                if query.is_empty() {
                    return path.to_string();
                }
                let pairs: Vec<String> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
                format!("{path}?{}", pairs.join("&"))
            }
        }
    }
}

impl From<&str> for Location {
    fn from(path: &str) -> Self {
        Self::Path(path.to_string())
    }
}

impl From<String> for Location {
    fn from(path: String) -> Self {
        Self::Path(path)
    }
}

impl FromStr for Location {
    type Err = LocationError;

    /// Parse one line of input: a JSON object when it starts with `{`,
    /// otherwise a plain path. Surrounding whitespace is ignored.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if !line.starts_with('{') {
            return Ok(Self::Path(line.to_string()));
        }
        let value: Value = serde_json::from_str(line).map_err(|e| LocationError::Json(e.to_string()))?;
        Self::try_from(value)
    }
}

impl TryFrom<Value> for Location {
    type Error = LocationError;

    /// Strings become paths; objects need a `route` key and every other
    /// key becomes an auxiliary param (non-strings are stringified).
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(path) => Ok(Self::Path(path)),
            Value::Null => Ok(Self::Path(String::new())),
            Value::Object(map) => {
                let route = match map.get("route") {
                    Some(Value::String(route)) => route.clone(),
                    _ => return Err(LocationError::MissingRoute),
                };
                let params = map
                    .into_iter()
                    .filter(|(key, _)| key != "route")
                    .map(|(key, value)| {
                        let value = match value {
                            Value::String(s) => s,
                            other => other.to_string(),
                        };
                        (key, value)
                    })
                    .collect();
                Ok(Self::Structured { route, params })
            }
            other => Err(LocationError::Unsupported(other.to_string())),
        }
    }
}

fn overlay(query: &mut Vec<(String, String)>, key: &str, value: &str) {
    match query.iter_mut().find(|(k, _)| k == key) {
        Some(entry) => entry.1 = value.to_string(),
        None => query.push((key.to_string(), value.to_string())),
    }
}

/// Byte offset where the query suffix starts, if any.
fn query_start(location: &str) -> Option<usize> {
    location.find('?').or_else(|| location.find('&'))
}

/// Split a location into its path and ordered query pairs.
fn split_query(location: &str) -> (&str, Vec<(String, String)>) {
    let Some(start) = query_start(location) else {
        return (location, Vec::new());
    };
    let separator = if location.contains('?') { '?' } else { '&' };

    let mut query = Vec::new();
    let crumbs = location[start + 1..]
        .split(separator)
        .flat_map(|part| part.split('&'))
        .filter(|crumb| !crumb.is_empty());
    for crumb in crumbs {
        let (key, value) = crumb.split_once('=').unwrap_or((crumb, ""));
        if !key.is_empty() {
            overlay(&mut query, key, value);
        }
    }
    (&location[..start], query)
}

/// Split a location into its path and query params.
pub fn extract_params(location: &str) -> (String, MatchParams) {
    let (path, query) = split_query(location);
    (path.to_string(), query.into_iter().collect())
}

/// Resolve `value` against the previously set location.
///
/// Absolute values (leading `/`) and the very first location are taken
/// as-is. Otherwise the previous location's final segment is dropped and
/// `value`'s segments are applied: `.` and empty segments are no-ops,
/// `..` pops one segment, popping past the root stays at the root.
pub fn normalize(previous: Option<&str>, value: &str) -> String {
    let Some(previous) = previous.filter(|previous| !previous.is_empty()) else {
        return value.to_string();
    };
    if value.starts_with('/') {
        return value.to_string();
    }

    let (value_path, suffix) = match query_start(value) {
        Some(start) => value.split_at(start),
        None => (value, ""),
    };
    let previous_path = match query_start(previous) {
        Some(start) => &previous[..start],
        None => previous,
    };

    let mut directory: Vec<&str> = previous_path.split('/').collect();
    directory.pop();

    let mut resolved: Vec<&str> = Vec::new();
    for segment in directory.into_iter().chain(value_path.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                resolved.pop();
            }
            segment => resolved.push(segment),
        }
    }

    let trailing = if value_path.ends_with('/') && !resolved.is_empty() { "/" } else { "" };
    format!("/{}{trailing}{suffix}", resolved.join("/"))
}
