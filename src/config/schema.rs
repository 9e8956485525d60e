//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the route
//! manager. All types derive Serde traits for deserialization from TOML.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the route manager.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ManagerConfig {
    /// Navigation behaviour (initial location, placeholder, gate timeout).
    pub navigation: NavigationConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Children of the root node, in declaration order.
    pub routes: Vec<RouteConfig>,
}

/// Navigation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Location resolved once at startup.
    pub initial_location: Option<String>,

    /// Inert state used to force re-entry of an unchanged state path.
    pub neutral_state: String,

    /// Upper bound on deferred gate completion, in milliseconds.
    pub gate_timeout_ms: Option<u64>,
}

impl NavigationConfig {
    pub fn gate_timeout(&self) -> Option<Duration> {
        self.gate_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            initial_location: None,
            neutral_state: "__neutral".to_string(),
            gate_timeout_ms: None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// One node of the route tree.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct RouteConfig {
    /// Node name, unique among its siblings.
    pub name: String,

    /// Token pattern (`posts/:postId`). Absent = pass-through.
    #[serde(default)]
    pub pattern: Option<String>,

    /// Regular expression matched against a single segment.
    #[serde(default)]
    pub regex: Option<String>,

    /// Param names bound to the regex capture groups, in order.
    #[serde(default)]
    pub captures: Vec<String>,

    /// Sibling priority (higher = preferred).
    #[serde(default)]
    pub priority: i32,

    /// Document title bound while this node is the nearest titled ancestor.
    #[serde(default)]
    pub document_title: Option<String>,

    /// Child nodes, in declaration order.
    #[serde(default)]
    pub children: Vec<RouteConfig>,
}
