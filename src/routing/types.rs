//! Shared routing types and error definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Parameters captured along a matched path, plus query parameters.
///
/// Values are the raw segment text; nothing is percent-decoded.
pub type MatchParams = BTreeMap<String, String>;

/// Name of the reserved fallback node. Never matched structurally.
pub const NOT_FOUND: &str = "404";

/// Separator between node names in a state path (`posts.post.comments`).
pub const STATE_SEPARATOR: char = '.';

/// Transient key/value store handed down the matched path to gates.
///
/// Each candidate branch works on its own copy, so writes made by one
/// branch's gates never leak into a sibling branch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
    values: serde_json::Map<String, Value>,
}

impl Context {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Write a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    /// Remove a value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Navigation as it stood when a trigger started.
///
/// Handed to every gate of that trigger, so admission can depend on where
/// navigation is coming from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingSnapshot {
    /// Location being resolved, query included.
    pub location: String,
    /// Params committed by the previous successful navigation.
    pub params: MatchParams,
    /// Dotted path of the active state, if any.
    pub active_state: Option<String>,
}

/// Errors raised while building a route tree.
///
/// Matching itself never fails with an error: mismatches and gate
/// rejections simply drop the candidate.
#[derive(Debug, Error)]
pub enum RouteError {
    /// A pattern string that cannot be tokenised.
    #[error("Malformed pattern on node '{node}': {reason}")]
    MalformedPattern { node: String, reason: String },

    /// A regular expression pattern that does not compile.
    #[error("Invalid regex on node '{node}': {source}")]
    InvalidRegex {
        node: String,
        #[source]
        source: regex::Error,
    },

    /// Two children of the same parent share a name.
    #[error("Duplicate child '{name}' under '{parent}'")]
    DuplicateSibling { parent: String, name: String },

    /// A dotted node path that names no node in the tree.
    #[error("No route node at path '{0}'")]
    UnknownNode(String),
}

/// Result type for route tree construction.
pub type RouteResult<T> = Result<T, RouteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_insert_and_read() {
        let mut context = Context::new();
        assert!(context.is_empty());

        context.insert("user", "alice");
        context.insert("admin", true);

        assert_eq!(context.get("user"), Some(&Value::from("alice")));
        assert_eq!(context.get("admin"), Some(&Value::Bool(true)));
        assert_eq!(context.len(), 2);

        assert_eq!(context.remove("user"), Some(Value::from("alice")));
        assert!(!context.contains_key("user"));
    }

    #[test]
    fn test_context_serializes_as_plain_object() {
        let mut context = Context::new();
        context.insert("n", 1);
        assert_eq!(serde_json::to_string(&context).unwrap(), r#"{"n":1}"#);
    }
}
